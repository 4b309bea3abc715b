//! Decoder for the compact reference grammar.
//!
//! A reference is a base name decorated with up to three markers: a leading
//! `!` (required, only meaningful on fields), a trailing `?` (nullable),
//! and a `[...]` wrapper (array of the inner reference). The markers are
//! stripped here, exactly once, at the boundary; nothing downstream ever
//! re-inspects the raw string.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SchemaError};

// ------------------------------ References -------------------------------- //

/// A type reference as written by a definition author.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeRef {
    /// Grammar string: base name with optional `!` / `?` / `[...]` markers.
    Name(String),
    /// Native array literal wrapping the element reference.
    List(Box<TypeRef>),
}

impl TypeRef {
    /// Array-of-element in the native (non-string) spelling.
    pub fn list(element: impl Into<TypeRef>) -> Self {
        TypeRef::List(Box::new(element.into()))
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        TypeRef::Name(value.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(value: String) -> Self {
        TypeRef::Name(value)
    }
}

// ------------------------------- Decoding --------------------------------- //

/// Where a reference appears. The `!` marker is a parse error outside
/// field and parameter positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefContext {
    TopLevel,
    Field,
}

/// A reference with all markers stripped and recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub required: bool,
    pub nullable: bool,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    /// A primitive name or type-definition identifier.
    Base(String),
    /// Array whose element is itself a decoded reference.
    Array(Box<Decoded>),
}

static ARRAY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(.*?)\]").unwrap());

/// Decode a reference into its `(required, nullable, shape)` parts.
pub fn decode(def: &TypeRef, ctx: RefContext) -> Result<Decoded> {
    match def {
        // The native list form is always non-nullable and non-required at
        // the wrapper itself; only the element carries markers.
        TypeRef::List(element) => {
            let element = decode(element, RefContext::TopLevel)?;
            Ok(Decoded {
                required: false,
                nullable: false,
                shape: Shape::Array(Box::new(element)),
            })
        }
        TypeRef::Name(def) => decode_str(def, ctx),
    }
}

fn decode_str(def: &str, ctx: RefContext) -> Result<Decoded> {
    let mut rest = def;

    let required = rest.starts_with('!');
    if required {
        if ctx != RefContext::Field {
            return Err(SchemaError::InvalidTypeReference(format!(
                "`{def}`: the `!` marker is only meaningful on fields"
            )));
        }
        rest = &rest[1..];
    }

    let nullable = rest.ends_with('?');

    // `[X]`, `[X]?` and `[X?]` all denote arrays; the element decodes its
    // own nullability.
    if let Some(captures) = ARRAY_RE.captures(rest) {
        let inner = &captures[1];
        if inner.is_empty() {
            return Err(SchemaError::InvalidTypeReference(format!(
                "`{def}`: empty array element"
            )));
        }
        let element = decode_str(inner, RefContext::TopLevel)?;
        return Ok(Decoded {
            required,
            nullable,
            shape: Shape::Array(Box::new(element)),
        });
    }

    let base = if nullable { &rest[..rest.len() - 1] } else { rest };
    if base.is_empty() || base.contains(['!', '?', '[', ']']) {
        return Err(SchemaError::InvalidTypeReference(def.to_string()));
    }

    Ok(Decoded {
        required,
        nullable,
        shape: Shape::Base(base.to_string()),
    })
}

// --------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;

    fn field(def: &str) -> Decoded {
        decode(&TypeRef::from(def), RefContext::Field).unwrap()
    }

    fn base(name: &str) -> Shape {
        Shape::Base(name.to_string())
    }

    #[test]
    fn bare_name() {
        let decoded = field("integer");
        assert_eq!(decoded.required, false);
        assert_eq!(decoded.nullable, false);
        assert_eq!(decoded.shape, base("integer"));
    }

    #[test]
    fn required_and_nullable_markers() {
        let decoded = field("!integer");
        assert!(decoded.required && !decoded.nullable);
        assert_eq!(decoded.shape, base("integer"));

        let decoded = field("string?");
        assert!(!decoded.required && decoded.nullable);
        assert_eq!(decoded.shape, base("string"));

        let decoded = field("!string?");
        assert!(decoded.required && decoded.nullable);
        assert_eq!(decoded.shape, base("string"));
    }

    #[test]
    fn array_forms() {
        let decoded = field("[string]");
        let Shape::Array(element) = decoded.shape else {
            panic!("expected array shape");
        };
        assert!(!decoded.nullable);
        assert_eq!(element.shape, base("string"));

        // nullable array of non-nullable elements
        let decoded = field("[string]?");
        assert!(decoded.nullable);
        let Shape::Array(element) = decoded.shape else {
            panic!("expected array shape");
        };
        assert!(!element.nullable);

        // non-nullable array of nullable elements
        let decoded = field("[string?]");
        assert!(!decoded.nullable);
        let Shape::Array(element) = decoded.shape else {
            panic!("expected array shape");
        };
        assert!(element.nullable);
    }

    #[test]
    fn native_list_form() {
        let decoded = decode(&TypeRef::list("string?"), RefContext::TopLevel).unwrap();
        assert!(!decoded.required && !decoded.nullable);
        let Shape::Array(element) = decoded.shape else {
            panic!("expected array shape");
        };
        assert!(element.nullable);
        assert_eq!(element.shape, base("string"));
    }

    #[test]
    fn required_marker_rejected_at_top_level() {
        let err = decode(&TypeRef::from("!integer"), RefContext::TopLevel).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeReference(_)));
    }

    #[test]
    fn required_marker_rejected_inside_brackets() {
        let err = decode(&TypeRef::from("[!integer]"), RefContext::Field).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidTypeReference(_)));
    }

    #[test]
    fn malformed_references() {
        for def in ["", "?", "!", "[]", "a?b"] {
            let err = decode(&TypeRef::from(def), RefContext::Field).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidTypeReference(_)),
                "expected InvalidTypeReference for {def:?}"
            );
        }
    }
}
