//! Declarative type definitions compiled to JSON Schema / OpenAPI fragments.
//!
//! Definitions use a compact reference grammar — `"!integer"` marks a
//! required field, `"string?"` a nullable one, `"[Account]"` an array —
//! and come in five kinds: products (objects), sums (string enums), maps,
//! unions, and input-parameter lists. The compiler walks them and emits
//! `serde_json` fragments in one of three nullability dialects, optionally
//! hoisting named types into a shared `components.schemas` table so that
//! repeated and self-referential types become `$ref` pointers.
//!
//! ```
//! use typed_schema::{Compiler, Field, Mode, TypeDef, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types.define("Account", TypeDef::product([
//!     ("id", Field::new("!integer")),
//!     ("email", Field::new("string?")),
//! ]))?;
//!
//! let mut compiler = Compiler::new(Mode::JSON_SCHEMA, &types);
//! let schema = compiler.compile("Account")?;
//! assert_eq!(schema["properties"]["email"], serde_json::json!({"type": ["string", "null"]}));
//! assert_eq!(schema["required"], serde_json::json!(["id"]));
//! # Ok::<(), typed_schema::SchemaError>(())
//! ```

pub mod cli;
pub mod compiler;
pub mod error;
pub mod grammar;
pub mod manifest;
pub mod primitives;
pub mod types;

pub use compiler::{Compiler, Mode, SCHEMA_REF_BASE};
pub use error::{Result, SchemaError};
pub use grammar::TypeRef;
pub use primitives::PrimitiveRegistry;
pub use types::{Field, FieldDoc, InputField, TypeDef, TypeRegistry};
