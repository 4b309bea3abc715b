//! Declarative manifests.
//!
//! A manifest is a JSON document declaring named type definitions:
//!
//! ```json
//! {
//!   "types": {
//!     "Account": {
//!       "kind": "product",
//!       "fields": {
//!         "id": "!integer",
//!         "email": {"type": "string?", "summary": "Contact address"},
//!         "roles": ["string"]
//!       }
//!     },
//!     "Color": {"kind": "enum", "values": ["red", "green", "blue"]}
//!   }
//! }
//! ```
//!
//! The raw serde shapes below convert into the typed registry; grammar
//! strings stay opaque here and are decoded later by the compiler.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::grammar::TypeRef;
use crate::types::{Field, FieldDoc, InputField, TypeDef, TypeRegistry};

// ------------------------------- Raw shapes ------------------------------- //

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    types: IndexMap<String, RawTypeDef>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum RawTypeDef {
    Product {
        fields: IndexMap<String, RawField>,
    },
    Enum {
        values: Vec<String>,
    },
    Map {
        #[serde(default)]
        value_type: Option<RawRef>,
        #[serde(default)]
        example: IndexMap<String, Value>,
    },
    Union {
        variants: Vec<RawRef>,
    },
    Input {
        fields: IndexMap<String, RawField>,
    },
}

/// A reference is written either as a grammar string or as a one-element
/// array (the native list spelling).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRef {
    Name(String),
    List(Vec<RawRef>),
}

/// A field is either a bare reference or an object carrying the
/// reference plus doc metadata.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawField {
    Def(RawRef),
    Documented {
        #[serde(rename = "type")]
        def: RawRef,
        #[serde(default)]
        summary: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        tags: Vec<String>,
        #[serde(rename = "enum", default)]
        enum_values: Option<Vec<String>>,
    },
}

// ------------------------------- Conversion ------------------------------- //

/// Parse a manifest source, reporting the JSON path on failure.
pub fn from_str(src: &str) -> Result<Manifest> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        SchemaError::Manifest(format!("at JSON path {path}: {}", err.into_inner()))
    })
}

impl Manifest {
    /// Convert into a fresh registry.
    pub fn into_registry(self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new();
        self.register_into(&mut registry)?;
        Ok(registry)
    }

    /// Register every declared type, in declaration order, into an
    /// existing registry. Names clashing across manifests are duplicates.
    pub fn register_into(self, registry: &mut TypeRegistry) -> Result<()> {
        for (name, raw) in self.types {
            let def = raw.into_def()?;
            registry.define(name, def)?;
        }
        Ok(())
    }
}

impl RawTypeDef {
    fn into_def(self) -> Result<TypeDef> {
        Ok(match self {
            RawTypeDef::Product { fields } => TypeDef::Product {
                fields: convert_fields(fields, RawField::into_field)?,
            },
            RawTypeDef::Enum { values } => TypeDef::Sum { values },
            RawTypeDef::Map {
                value_type,
                example,
            } => TypeDef::Map {
                value_def: value_type.map(RawRef::into_ref).transpose()?,
                example,
            },
            RawTypeDef::Union { variants } => TypeDef::Union {
                variants: variants
                    .into_iter()
                    .map(RawRef::into_ref)
                    .collect::<Result<_>>()?,
            },
            RawTypeDef::Input { fields } => TypeDef::Input {
                fields: convert_fields(fields, RawField::into_input_field)?,
            },
        })
    }
}

fn convert_fields<T>(
    fields: IndexMap<String, RawField>,
    convert: fn(RawField) -> Result<T>,
) -> Result<IndexMap<String, T>> {
    fields
        .into_iter()
        .map(|(name, raw)| Ok((name, convert(raw)?)))
        .collect()
}

impl RawRef {
    fn into_ref(self) -> Result<TypeRef> {
        match self {
            RawRef::Name(name) => Ok(TypeRef::Name(name)),
            RawRef::List(mut elements) => {
                if elements.len() != 1 {
                    return Err(SchemaError::Manifest(format!(
                        "the array form wraps exactly one element, got {}",
                        elements.len()
                    )));
                }
                Ok(TypeRef::List(Box::new(elements.remove(0).into_ref()?)))
            }
        }
    }
}

impl RawField {
    fn into_field(self) -> Result<Field> {
        match self {
            RawField::Def(def) => Ok(Field {
                def: def.into_ref()?,
                doc: None,
            }),
            RawField::Documented {
                def,
                summary,
                description,
                tags,
                enum_values,
            } => Ok(Field {
                def: def.into_ref()?,
                doc: Some(FieldDoc {
                    summary,
                    description,
                    tags,
                    enum_values,
                }),
            }),
        }
    }

    fn into_input_field(self) -> Result<InputField> {
        match self {
            RawField::Def(RawRef::Name(def)) => Ok(InputField { def, doc: None }),
            RawField::Documented {
                def: RawRef::Name(def),
                summary,
                description,
                tags,
                enum_values,
            } => Ok(InputField {
                def,
                doc: Some(FieldDoc {
                    summary,
                    description,
                    tags,
                    enum_values,
                }),
            }),
            _ => Err(SchemaError::Manifest(
                "input fields are written as `location:definition` strings".into(),
            )),
        }
    }
}
