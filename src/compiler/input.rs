//! Input-parameter compilation.
//!
//! Input definitions flatten into an ordered list of `{name, in,
//! required, schema}` descriptors instead of a schema tree. They are
//! never nullable, arrayed, or extracted by reference.

use serde_json::{json, Value};

use crate::error::{Result, SchemaError};
use crate::grammar::{self, RefContext, TypeRef};
use crate::types::{FieldDoc, InputField, TypeDef};

use super::Compiler;

pub(super) fn compile_input(compiler: &mut Compiler<'_>, name: &str) -> Result<Value> {
    let types = compiler.types;
    let Some(TypeDef::Input { fields }) = types.get(name) else {
        return Err(SchemaError::AmbiguousOrUnknownTypeKind(name.to_string()));
    };

    let mut descriptors = Vec::with_capacity(fields.len());
    for (field_name, field) in fields {
        descriptors.push(compile_input_field(compiler, field_name, field)?);
    }
    Ok(Value::Array(descriptors))
}

fn compile_input_field(
    compiler: &mut Compiler<'_>,
    name: &str,
    field: &InputField,
) -> Result<Value> {
    let (location, rest) = split_location(&field.def);

    let required = rest.starts_with('!');
    let rest = if required { &rest[1..] } else { rest };

    // The remainder decodes like any field reference; its own required
    // marker was consumed above and only the nullability survives into
    // the schema.
    let decoded = grammar::decode(&TypeRef::from(rest), RefContext::Field)?;
    let mut chain = Vec::new();
    let schema = compiler.compile_decoded(&decoded, &mut chain)?;

    let mut descriptor = json!({
        "name": name,
        "in": location,
        "required": required,
        "schema": schema,
    });

    if let Some(doc) = &field.doc {
        let text = doc_text(doc);
        if !text.is_empty() {
            descriptor["description"] = Value::from(text);
        }
    }

    Ok(descriptor)
}

/// Split a raw input definition into its source location and the
/// remaining type definition. No `:` means the value comes from the
/// query string.
fn split_location(def: &str) -> (&str, &str) {
    match def.split_once(':') {
        Some((location, rest)) => (location, rest),
        None => ("query", def),
    }
}

fn doc_text(doc: &FieldDoc) -> String {
    let summary = doc.summary.as_deref().unwrap_or("").trim();
    let description = doc.description.as_deref().unwrap_or("").trim();
    match (summary.is_empty(), description.is_empty()) {
        (false, false) => format!("{summary}\n\n{description}"),
        (false, true) => summary.to_string(),
        (true, false) => description.to_string(),
        (true, true) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_defaults_to_query() {
        assert_eq!(split_location("number"), ("query", "number"));
        assert_eq!(split_location("body:!Account"), ("body", "!Account"));
        assert_eq!(split_location("path:!integer"), ("path", "!integer"));
    }

    #[test]
    fn doc_text_joins_summary_and_description() {
        let doc = FieldDoc {
            summary: Some("Page size".into()),
            description: Some("Defaults to 20.".into()),
            ..FieldDoc::default()
        };
        assert_eq!(doc_text(&doc), "Page size\n\nDefaults to 20.");

        let doc = FieldDoc {
            summary: Some("  Page size  ".into()),
            ..FieldDoc::default()
        };
        assert_eq!(doc_text(&doc), "Page size");
    }
}
