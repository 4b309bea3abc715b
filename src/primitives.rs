//! Primitive scalar types and their fixed schema fragments.

use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::error::{Result, SchemaError};

/// Producer of a primitive's schema fragment. Pure: no parameters, no state.
pub type FragmentFn = fn() -> Value;

/// Registry of primitive scalar types, keyed by grammar name.
///
/// Owned by the compiler (or injected at construction); there is no
/// process-global table, so independently configured compilers never
/// observe each other's registrations.
#[derive(Clone)]
pub struct PrimitiveRegistry {
    entries: IndexMap<String, FragmentFn>,
}

impl PrimitiveRegistry {
    /// A registry with no entries at all, for callers that want full control.
    pub fn empty() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Add or overwrite an entry.
    pub fn register(&mut self, name: impl Into<String>, producer: FragmentFn) {
        self.entries.insert(name.into(), producer);
    }

    pub fn resolve(&self, name: &str) -> Result<FragmentFn> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownPrimitiveType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl Default for PrimitiveRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("integer", integer);
        registry.register("number", number);
        registry.register("string", string);
        registry.register("boolean", boolean);
        registry.register("dict", dict);
        registry.register("binary", binary);
        registry.register("timestamp", timestamp);
        registry.register("date", date);
        registry.register("time", time);
        registry
    }
}

// ------------------------------ Fragments --------------------------------- //

fn integer() -> Value {
    json!({"type": "integer"})
}

fn number() -> Value {
    json!({"type": "number"})
}

fn string() -> Value {
    json!({"type": "string"})
}

fn boolean() -> Value {
    json!({"type": "boolean"})
}

/// Bare object with unconstrained keys and values.
fn dict() -> Value {
    json!({"type": "object"})
}

fn binary() -> Value {
    json!({"type": "string", "format": "binary"})
}

fn date() -> Value {
    json!({
        "type": "string",
        "format": "date",
        "pattern": r"^\d{4}-\d{2}-\d{2}$",
    })
}

fn time() -> Value {
    json!({
        "type": "string",
        "pattern": r"^\d{2}-\d{2}-\d{2}$",
    })
}

fn timestamp() -> Value {
    json!({
        "type": "string",
        "format": "timestamp",
        "pattern": r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve() {
        let registry = PrimitiveRegistry::default();
        for name in [
            "integer",
            "number",
            "string",
            "boolean",
            "dict",
            "binary",
            "date",
            "time",
            "timestamp",
        ] {
            let producer = registry.resolve(name).unwrap();
            assert!(producer().is_object());
        }
    }

    #[test]
    fn unknown_name_fails() {
        let registry = PrimitiveRegistry::default();
        let err = registry.resolve("decimal").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownPrimitiveType(_)));
    }

    #[test]
    fn register_overwrites() {
        fn narrow_string() -> Value {
            json!({"type": "string", "maxLength": 8})
        }

        let mut registry = PrimitiveRegistry::default();
        registry.register("string", narrow_string);
        let producer = registry.resolve("string").unwrap();
        assert_eq!(producer()["maxLength"], json!(8));
    }
}
