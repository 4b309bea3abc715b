//! Schema compilation engine.
//!
//! `Compiler` walks decoded references and emits `serde_json` fragments.
//! One instance owns one extracted-schema table and one memo table; both
//! are mutated only inside `compile` calls, so concurrent compiles need
//! separate instances. The recursion chain is a plain stack scoped to a
//! single top-level call, threaded explicitly through the descent.

pub mod input;

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::error::{Result, SchemaError};
use crate::grammar::{self, Decoded, RefContext, Shape, TypeRef};
use crate::primitives::PrimitiveRegistry;
use crate::types::{Category, Field, TypeDef, TypeRegistry};

// --------------------------------- Mode ----------------------------------- //

/// Output dialect selection, a composable bitset.
///
/// `OPEN_API_31` refines `OPEN_API`: the 3.1 dialect drops the `nullable`
/// flag and reuses the type-array union. On its own it behaves like
/// `JSON_SCHEMA`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mode(u8);

impl Mode {
    pub const JSON_SCHEMA: Mode = Mode(1);
    pub const OPEN_API: Mode = Mode(2);
    pub const REF_SCHEMA: Mode = Mode(4);
    pub const OPEN_API_31: Mode = Mode(8);

    pub fn contains(self, other: Mode) -> bool {
        self.0 & other.0 == other.0
    }

    fn ref_schema(self) -> bool {
        self.contains(Mode::REF_SCHEMA)
    }

    /// Whether "T or null" is spelled as a sibling `nullable: true` flag
    /// rather than widening `type` to include `"null"`.
    fn nullable_flag(self) -> bool {
        self.contains(Mode::OPEN_API) && !self.contains(Mode::OPEN_API_31)
    }
}

impl std::ops::BitOr for Mode {
    type Output = Mode;

    fn bitor(self, rhs: Mode) -> Mode {
        Mode(self.0 | rhs.0)
    }
}

/// Base path for extracted-schema pointers, shared by every dialect.
pub const SCHEMA_REF_BASE: &str = "#/components/schemas/";

// ------------------------------- Compiler --------------------------------- //

pub struct Compiler<'t> {
    mode: Mode,
    primitives: PrimitiveRegistry,
    types: &'t TypeRegistry,
    /// Extracted named schemas, populated lazily in ref mode.
    schemas: IndexMap<String, Value>,
    /// Per-instance result cache keyed by canonical reference spelling.
    /// The mode is fixed per instance, so entries never cross modes.
    memo: HashMap<String, Value>,
}

impl<'t> Compiler<'t> {
    pub fn new(mode: Mode, types: &'t TypeRegistry) -> Self {
        Self::with_primitives(mode, types, PrimitiveRegistry::default())
    }

    pub fn with_primitives(
        mode: Mode,
        types: &'t TypeRegistry,
        primitives: PrimitiveRegistry,
    ) -> Self {
        Self {
            mode,
            primitives,
            types,
            schemas: IndexMap::new(),
            memo: HashMap::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Named schemas extracted so far, in first-encounter order. Embed
    /// under `components.schemas` (or equivalent) when assembling a
    /// document.
    pub fn schemas(&self) -> &IndexMap<String, Value> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, Value> {
        self.schemas
    }

    /// Compile a type reference into a schema fragment.
    ///
    /// Input definitions compile to a flat descriptor list; everything
    /// else compiles to a nested schema tree.
    pub fn compile(&mut self, def: impl Into<TypeRef>) -> Result<Value> {
        let def = def.into();
        let result = self.compile_root(&def);
        if result.is_err() {
            // memo entries written while descending into a failed tree may
            // point at definitions that were never stored; drop them all
            self.memo.clear();
        }
        result
    }

    fn compile_root(&mut self, def: &TypeRef) -> Result<Value> {
        let decoded = grammar::decode(def, RefContext::TopLevel)?;

        if let Shape::Base(name) = &decoded.shape {
            if matches!(self.types.get(name), Some(TypeDef::Input { .. })) {
                if decoded.nullable {
                    return Err(SchemaError::InvalidTypeReference(format!(
                        "input type `{name}` cannot be nullable"
                    )));
                }
                return input::compile_input(self, name);
            }
        }

        let mut chain = Vec::new();
        let fragment = self.compile_decoded(&decoded, &mut chain)?;
        debug_assert!(chain.is_empty());
        Ok(fragment)
    }

    fn compile_decoded(&mut self, decoded: &Decoded, chain: &mut Vec<String>) -> Result<Value> {
        let key = memo_key(decoded);
        if let Some(hit) = self.memo.get(&key) {
            return Ok(hit.clone());
        }

        let fragment = match &decoded.shape {
            Shape::Array(element) => {
                let items = self.compile_decoded(element, chain)?;
                let schema = json!({"type": "array", "items": items});
                self.apply_plain_nullable(schema, decoded.nullable)
            }
            Shape::Base(name) => self.compile_base(name, decoded.nullable, chain)?,
        };

        self.memo.insert(key, fragment.clone());
        Ok(fragment)
    }

    fn compile_base(&mut self, name: &str, nullable: bool, chain: &mut Vec<String>) -> Result<Value> {
        match self.types.classify(&self.primitives, name)? {
            Category::Scalar => self.compile_scalar(name, nullable),
            Category::Input => Err(SchemaError::AmbiguousOrUnknownTypeKind(format!(
                "input type `{name}` cannot be embedded in a schema"
            ))),
            category => self.compile_named(name, category, nullable, chain),
        }
    }

    fn compile_scalar(&mut self, name: &str, nullable: bool) -> Result<Value> {
        let producer = self.primitives.resolve(name)?;
        Ok(self.apply_plain_nullable(producer(), nullable))
    }

    /// Compile a named Product/Sum/Map/Union occurrence, handling cycles
    /// and reference extraction.
    fn compile_named(
        &mut self,
        name: &str,
        category: Category,
        nullable: bool,
        chain: &mut Vec<String>,
    ) -> Result<Value> {
        // Already expanding this name somewhere up the call chain: do not
        // re-enter. A pointer is the only terminating spelling, and it
        // needs extraction to point at something.
        if chain.iter().any(|entry| entry == name) {
            if !self.mode.ref_schema() {
                return Err(SchemaError::UnterminatedRecursion(name.to_string()));
            }
            return Ok(apply_ref_nullable(schema_ref(name), nullable));
        }

        // Exact re-encounter of an already-extracted name: pointer only,
        // no recompilation.
        if self.mode.ref_schema() && self.schemas.contains_key(name) {
            return Ok(apply_ref_nullable(schema_ref(name), nullable));
        }

        chain.push(name.to_string());
        let body = self.compile_body(name, category, chain);
        chain.pop();
        let body = body?;

        if self.mode.ref_schema() {
            self.schemas.insert(name.to_string(), body);
            return Ok(apply_ref_nullable(schema_ref(name), nullable));
        }

        if !nullable {
            return Ok(body);
        }
        Ok(match category {
            // a union absorbs null as one more alternative
            Category::Union => {
                let mut body = body;
                if let Some(alternatives) = body["oneOf"].as_array_mut() {
                    alternatives.push(json!({"type": "null"}));
                }
                body
            }
            _ => self.apply_plain_nullable_always(body),
        })
    }

    fn compile_body(
        &mut self,
        name: &str,
        category: Category,
        chain: &mut Vec<String>,
    ) -> Result<Value> {
        let types = self.types;
        match (category, types.get(name)) {
            (Category::Product, Some(TypeDef::Product { fields })) => {
                self.compile_product(fields, chain)
            }
            (Category::Sum, Some(TypeDef::Sum { values })) => {
                Ok(json!({"type": "string", "enum": values}))
            }
            (Category::Map, Some(TypeDef::Map { value_def, example })) => {
                self.compile_map(value_def.as_ref(), example, chain)
            }
            (Category::Union, Some(TypeDef::Union { variants })) => {
                self.compile_union(variants, chain)
            }
            _ => Err(SchemaError::AmbiguousOrUnknownTypeKind(name.to_string())),
        }
    }

    fn compile_product(
        &mut self,
        fields: &IndexMap<String, Field>,
        chain: &mut Vec<String>,
    ) -> Result<Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for (field_name, field) in fields {
            let decoded = grammar::decode(&field.def, RefContext::Field)?;
            let mut schema = self.compile_decoded(&decoded, chain)?;

            if let Some(doc) = &field.doc {
                // an explicit value list wins over whatever the reference
                // compiled to, pointers included
                if let Some(values) = &doc.enum_values {
                    schema = json!({"type": "string", "enum": values});
                }
                if let Some(summary) = trimmed(doc.summary.as_deref()) {
                    schema["title"] = Value::from(summary);
                }
                if let Some(description) = trimmed(doc.description.as_deref()) {
                    schema["description"] = Value::from(description);
                }
            }

            properties.insert(field_name.clone(), schema);
            if decoded.required {
                required.push(Value::from(field_name.clone()));
            }
        }

        let mut schema = json!({"type": "object", "properties": properties});
        if !required.is_empty() {
            schema["required"] = Value::Array(required);
        }
        Ok(schema)
    }

    fn compile_map(
        &mut self,
        value_def: Option<&TypeRef>,
        example: &IndexMap<String, Value>,
        chain: &mut Vec<String>,
    ) -> Result<Value> {
        let mut schema = json!({"type": "object"});

        if let Some(value_def) = value_def {
            let decoded = grammar::decode(value_def, RefContext::TopLevel)?;
            schema["additionalProperties"] = self.compile_decoded(&decoded, chain)?;
        }

        if !example.is_empty() {
            let entries: Map<String, Value> = example
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            schema["example"] = Value::Object(entries);
        }

        Ok(schema)
    }

    fn compile_union(&mut self, variants: &[TypeRef], chain: &mut Vec<String>) -> Result<Value> {
        let mut alternatives = Vec::with_capacity(variants.len());
        for variant in variants {
            let decoded = grammar::decode(variant, RefContext::TopLevel)?;
            alternatives.push(self.compile_decoded(&decoded, chain)?);
        }
        Ok(json!({"oneOf": alternatives}))
    }

    // ----------------------- Nullability encodings ------------------------ //

    fn apply_plain_nullable(&self, schema: Value, nullable: bool) -> Value {
        if !nullable {
            return schema;
        }
        self.apply_plain_nullable_always(schema)
    }

    /// Encode "T or null" on a fragment carrying its own `type` key:
    /// either widen `type` into a two-element set or set the 3.0 flag.
    fn apply_plain_nullable_always(&self, mut schema: Value) -> Value {
        if self.mode.nullable_flag() {
            schema["nullable"] = Value::Bool(true);
        } else {
            let current = schema["type"].take();
            schema["type"] = json!([current, "null"]);
        }
        schema
    }
}

/// Encode "T or null" on a pointer, which cannot carry a `type` key.
/// Nullability is a property of the occurrence, never of the stored
/// definition, so the wrapper goes around the `$ref` in every dialect.
fn apply_ref_nullable(schema: Value, nullable: bool) -> Value {
    if !nullable {
        return schema;
    }
    json!({"oneOf": [schema, {"type": "null"}]})
}

fn schema_ref(name: &str) -> Value {
    json!({"$ref": format!("{SCHEMA_REF_BASE}{name}")})
}

/// Canonical spelling of a decoded reference. The required marker is
/// excluded: it affects the enclosing object's `required` list, never the
/// field's own fragment.
fn memo_key(decoded: &Decoded) -> String {
    fn render(decoded: &Decoded, out: &mut String) {
        match &decoded.shape {
            Shape::Base(name) => out.push_str(name),
            Shape::Array(element) => {
                out.push('[');
                render(element, out);
                out.push(']');
            }
        }
        if decoded.nullable {
            out.push('?');
        }
    }

    let mut out = String::new();
    render(decoded, &mut out);
    out
}

fn trimmed(text: Option<&str>) -> Option<&str> {
    let text = text?.trim();
    if text.is_empty() { None } else { Some(text) }
}
