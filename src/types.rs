//! Type definitions, the named-type registry, and category classification.
//!
//! Definitions are a closed set of tagged variants declared once at
//! construction, in field/variant order. Nothing here is discovered at
//! runtime; what you declare is what compiles.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::grammar::TypeRef;
use crate::primitives::PrimitiveRegistry;

// ------------------------------ Field model ------------------------------- //

/// Documentation metadata attached to a field by the comment-extraction
/// layer. The compiler consumes these as plain strings; `tags` pass
/// through untouched for the document-assembly layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDoc {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Explicit value list; when present it overrides the field's
    /// compiled schema entirely.
    pub enum_values: Option<Vec<String>>,
}

/// A product field: reference plus optional doc metadata.
#[derive(Clone, Debug)]
pub struct Field {
    pub def: TypeRef,
    pub doc: Option<FieldDoc>,
}

impl Field {
    pub fn new(def: impl Into<TypeRef>) -> Self {
        Self {
            def: def.into(),
            doc: None,
        }
    }

    pub fn with_doc(def: impl Into<TypeRef>, doc: FieldDoc) -> Self {
        Self {
            def: def.into(),
            doc: Some(doc),
        }
    }
}

/// An input-parameter field: raw `location:definition` string plus
/// optional doc metadata. The location split happens at compile time.
#[derive(Clone, Debug)]
pub struct InputField {
    pub def: String,
    pub doc: Option<FieldDoc>,
}

impl InputField {
    pub fn new(def: impl Into<String>) -> Self {
        Self {
            def: def.into(),
            doc: None,
        }
    }

    pub fn with_doc(def: impl Into<String>, doc: FieldDoc) -> Self {
        Self {
            def: def.into(),
            doc: Some(doc),
        }
    }
}

// ------------------------------ Definitions ------------------------------- //

/// The closed set of definable type kinds.
#[derive(Clone, Debug)]
pub enum TypeDef {
    /// Object with named, ordered, typed fields.
    Product { fields: IndexMap<String, Field> },
    /// Fixed ordered list of string literal values.
    Sum { values: Vec<String> },
    /// Object with a uniform, optionally typed value for all keys.
    Map {
        value_def: Option<TypeRef>,
        example: IndexMap<String, Value>,
    },
    /// Any one of the listed alternatives.
    Union { variants: Vec<TypeRef> },
    /// Ordered parameter list; compiles to descriptors, not a schema tree.
    Input {
        fields: IndexMap<String, InputField>,
    },
}

impl TypeDef {
    pub fn product<K: Into<String>>(fields: impl IntoIterator<Item = (K, Field)>) -> Self {
        TypeDef::Product {
            fields: fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }

    pub fn sum<V: Into<String>>(values: impl IntoIterator<Item = V>) -> Self {
        TypeDef::Sum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn map(value_def: Option<TypeRef>) -> Self {
        TypeDef::Map {
            value_def,
            example: IndexMap::new(),
        }
    }

    pub fn union<R: Into<TypeRef>>(variants: impl IntoIterator<Item = R>) -> Self {
        TypeDef::Union {
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }

    pub fn input<K: Into<String>>(fields: impl IntoIterator<Item = (K, InputField)>) -> Self {
        TypeDef::Input {
            fields: fields.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        }
    }
}

// ------------------------- Registry + classifier -------------------------- //

/// The category the compiler dispatches on once a base name resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Input,
    Product,
    Sum,
    Map,
    Union,
    Scalar,
}

/// Named type definitions, insertion-ordered, immutable once built.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    defs: IndexMap<String, TypeDef>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition under a name. Names are unique; redefining
    /// one is a configuration error.
    pub fn define(&mut self, name: impl Into<String>, def: TypeDef) -> Result<()> {
        let name = name.into();
        if self.defs.contains_key(&name) {
            return Err(SchemaError::DuplicateType(name));
        }
        self.defs.insert(name, def);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.defs.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Place a bare base name into exactly one category. Definitions take
    /// precedence over primitives (Input > Product > Sum > Map > Union >
    /// Scalar fallback); a name matching neither is an unknown primitive.
    pub fn classify(&self, primitives: &PrimitiveRegistry, base: &str) -> Result<Category> {
        if let Some(def) = self.defs.get(base) {
            return Ok(match def {
                TypeDef::Input { .. } => Category::Input,
                TypeDef::Product { .. } => Category::Product,
                TypeDef::Sum { .. } => Category::Sum,
                TypeDef::Map { .. } => Category::Map,
                TypeDef::Union { .. } => Category::Union,
            });
        }

        if primitives.contains(base) {
            return Ok(Category::Scalar);
        }

        Err(SchemaError::UnknownPrimitiveType(base.to_string()))
    }
}
