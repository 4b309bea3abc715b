//! Manifest loading tests: declarative JSON in, compiled schemas out.

use serde_json::json;
use typed_schema::{manifest, Compiler, Field, Mode, SchemaError, TypeDef, TypeRegistry, TypeRef};

const MANIFEST: &str = r#"{
    "types": {
        "Account": {
            "kind": "product",
            "fields": {
                "id": "!integer",
                "email": {"type": "string?", "summary": "Contact address"},
                "roles": ["string"]
            }
        },
        "Color": {"kind": "enum", "values": ["red", "green", "blue"]},
        "Counters": {
            "kind": "map",
            "value_type": "integer",
            "example": {"a": 1}
        },
        "Id": {"kind": "union", "variants": ["string", "integer"]},
        "ListAccounts": {
            "kind": "input",
            "fields": {
                "limit": "query:!number",
                "account": "body:!Account"
            }
        }
    }
}"#;

#[test]
fn manifest_matches_the_code_built_registry() {
    let from_manifest = manifest::from_str(MANIFEST)
        .unwrap()
        .into_registry()
        .unwrap();

    let mut from_code = TypeRegistry::new();
    from_code
        .define(
            "Account",
            TypeDef::product([
                ("id", Field::new("!integer")),
                (
                    "email",
                    Field::with_doc(
                        "string?",
                        typed_schema::FieldDoc {
                            summary: Some("Contact address".into()),
                            ..Default::default()
                        },
                    ),
                ),
                ("roles", Field::new(TypeRef::list("string"))),
            ]),
        )
        .unwrap();
    from_code
        .define("Color", TypeDef::sum(["red", "green", "blue"]))
        .unwrap();
    from_code
        .define(
            "Counters",
            TypeDef::Map {
                value_def: Some("integer".into()),
                example: [("a".to_string(), json!(1))].into_iter().collect(),
            },
        )
        .unwrap();
    from_code
        .define("Id", TypeDef::union(["string", "integer"]))
        .unwrap();
    from_code
        .define(
            "ListAccounts",
            TypeDef::input([
                ("limit", typed_schema::InputField::new("query:!number")),
                ("account", typed_schema::InputField::new("body:!Account")),
            ]),
        )
        .unwrap();

    for root in ["Account", "Color?", "Counters", "Id", "[Account]", "ListAccounts"] {
        let mut left = Compiler::new(Mode::JSON_SCHEMA, &from_manifest);
        let mut right = Compiler::new(Mode::JSON_SCHEMA, &from_code);
        assert_eq!(
            left.compile(root).unwrap(),
            right.compile(root).unwrap(),
            "diverged on {root}"
        );
    }
}

#[test]
fn manifest_compiles_with_extraction() {
    let types = manifest::from_str(MANIFEST)
        .unwrap()
        .into_registry()
        .unwrap();
    let mut compiler = Compiler::new(Mode::OPEN_API | Mode::REF_SCHEMA, &types);

    let descriptors = compiler.compile("ListAccounts").unwrap();
    assert_eq!(
        descriptors[1]["schema"],
        json!({"$ref": "#/components/schemas/Account"})
    );
    assert_eq!(
        compiler.schemas()["Account"]["properties"]["email"],
        json!({"type": "string", "nullable": true, "title": "Contact address"})
    );
}

#[test]
fn duplicate_names_across_manifests_are_rejected() {
    let first = r#"{"types": {"Color": {"kind": "enum", "values": ["red"]}}}"#;
    let second = r#"{"types": {"Color": {"kind": "enum", "values": ["blue"]}}}"#;

    let mut registry = TypeRegistry::new();
    manifest::from_str(first)
        .unwrap()
        .register_into(&mut registry)
        .unwrap();
    let err = manifest::from_str(second)
        .unwrap()
        .register_into(&mut registry)
        .unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateType(name) if name == "Color"));
}

#[test]
fn parse_errors_carry_the_json_path() {
    let broken = r#"{"types": {"Color": {"kind": "enum", "values": "red"}}}"#;
    let err = manifest::from_str(broken).unwrap_err();
    let SchemaError::Manifest(message) = err else {
        panic!("expected a manifest error");
    };
    assert!(message.contains("types.Color"), "path missing in: {message}");
}

#[test]
fn array_form_must_wrap_exactly_one_element() {
    let broken = r#"{"types": {"Bad": {"kind": "product", "fields": {"xs": ["string", "integer"]}}}}"#;
    let err = manifest::from_str(broken).unwrap().into_registry().unwrap_err();
    assert!(matches!(err, SchemaError::Manifest(_)));
}

#[test]
fn input_fields_must_be_strings() {
    let broken = r#"{"types": {"Bad": {"kind": "input", "fields": {"xs": ["string"]}}}}"#;
    let err = manifest::from_str(broken).unwrap().into_registry().unwrap_err();
    assert!(matches!(err, SchemaError::Manifest(_)));
}
