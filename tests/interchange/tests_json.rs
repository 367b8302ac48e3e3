//! JSON codec behaviour on hand-written documents.

use aas::interchange::{CodecOptions, EnvironmentFormat, InterchangeError, Json};
use aas::model::{Constraint, DataTypeDefXsd, ElementKind, SubmodelElement, Value};
use serde_json::{Value as JsonValue, json};

use crate::helpers::*;

fn document(elements: JsonValue) -> Vec<u8> {
    json!({
        "submodels": [{
            "modelType": "Submodel",
            "id": "urn:sm:1",
            "idShort": "TechnicalData",
            "submodelElements": elements
        }]
    })
    .to_string()
    .into_bytes()
}

fn int_property(extra: JsonValue) -> JsonValue {
    let mut property = json!({
        "modelType": "Property",
        "idShort": "MaxRpm",
        "valueType": "xs:int",
        "value": "5000"
    });
    if let (Some(p), Some(extra)) = (property.as_object_mut(), extra.as_object()) {
        p.extend(extra.clone());
    }
    property
}

#[test]
fn test_model_type_names_every_element() {
    let bytes = Json::new().write(&motor_environment()).unwrap();
    let doc: JsonValue = serde_json::from_slice(&bytes).unwrap();
    let written: Vec<&str> = doc["submodels"][0]["submodelElements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["modelType"].as_str().unwrap())
        .collect();
    for kind in ElementKind::ALL {
        assert!(written.contains(&kind.model_type()), "no {}", kind.model_type());
    }
    assert_eq!(doc["submodels"][0]["modelType"], "Submodel");
    assert_eq!(doc["assetAdministrationShells"][0]["modelType"], "AssetAdministrationShell");
}

#[test]
fn test_values_are_written_as_strings() {
    let bytes = Json::new().write(&motor_environment()).unwrap();
    let doc: JsonValue = serde_json::from_slice(&bytes).unwrap();
    let max_speed = &doc["submodels"][0]["submodelElements"][0];
    assert_eq!(max_speed["idShort"], "MaxRotationSpeed");
    assert_eq!(max_speed["value"], "5000");
    assert_eq!(max_speed["qualifiers"][0]["value"], "12");
    assert_eq!(max_speed["qualifiers"][0]["valueType"], "xs:int");
}

#[test]
fn test_qualifier_value_must_match_type() {
    let bytes = document(json!([int_property(json!({
        "qualifiers": [{ "type": "tolerance", "valueType": "xs:int", "value": "12.5" }]
    }))]));
    match Json::new().read(&bytes) {
        Err(InterchangeError::ValueTypeMismatch {
            value_type, value, ..
        }) => {
            assert_eq!(value_type, DataTypeDefXsd::Int);
            assert_eq!(value, "12.5");
        }
        other => panic!("expected a value type mismatch, got {other:?}"),
    }
}

#[test]
fn test_integer_lexical_forms_normalize() {
    let bytes = document(json!([int_property(json!({ "value": "+05000" }))]));
    let env = Json::new().read(&bytes).unwrap();
    let SubmodelElement::Property(p) = env
        .submodel("urn:sm:1")
        .unwrap()
        .elements()
        .get("MaxRpm")
        .unwrap()
    else {
        panic!("not a property");
    };
    assert_eq!(p.value(), Some(&Value::Integer(5000)));
    assert_eq!(p.value().unwrap().render(), "5000");
}

#[test]
fn test_unknown_fields_are_ignored_by_default() {
    let bytes = document(json!([int_property(json!({ "extraneous": true }))]));
    let env = Json::new().read(&bytes).unwrap();
    assert!(env.submodel("urn:sm:1").unwrap().elements().contains("MaxRpm"));
}

#[test]
fn test_unknown_fields_rejected_in_strict_mode() {
    let bytes = document(json!([int_property(json!({ "extraneous": true }))]));
    match Json::with_options(CodecOptions::strict()).read(&bytes) {
        Err(InterchangeError::UnknownField { path, field }) => {
            assert_eq!(field, "extraneous");
            assert_eq!(path, "submodels/0/submodelElements/MaxRpm");
        }
        other => panic!("expected an unknown field error, got {other:?}"),
    }
}

#[test]
fn test_nested_referred_semantic_id_is_kept() {
    let semantic_id = json!({
        "type": "ExternalReference",
        "referredSemanticId": {
            "type": "ExternalReference",
            "keys": [{ "type": "GlobalReference", "value": "urn:semantics:rpm" }]
        },
        "keys": [{ "type": "GlobalReference", "value": "urn:concept:rpm" }]
    });
    let bytes = document(json!([int_property(json!({ "semanticId": semantic_id }))]));
    let json = Json::with_options(CodecOptions::strict());
    let env = json.read(&bytes).unwrap();

    let written: JsonValue = serde_json::from_slice(&json.write(&env).unwrap()).unwrap();
    let semantic = &written["submodels"][0]["submodelElements"][0]["semanticId"];
    assert_eq!(semantic, &semantic_id);
}

#[test]
fn test_duplicate_id_short_is_rejected() {
    let bytes = document(json!([int_property(json!({})), int_property(json!({}))]));
    match Json::new().read(&bytes) {
        Err(InterchangeError::ConstraintViolation { constraint, .. }) => {
            assert_eq!(constraint, Constraint::IdShortUnique);
        }
        other => panic!("expected a uniqueness violation, got {other:?}"),
    }
}

#[test]
fn test_duplicate_identifier_is_rejected() {
    let bytes = json!({
        "submodels": [{ "modelType": "Submodel", "id": "urn:x" }],
        "conceptDescriptions": [{ "modelType": "ConceptDescription", "id": "urn:x" }]
    })
    .to_string();
    match Json::new().read(bytes.as_bytes()) {
        Err(InterchangeError::ConstraintViolation { constraint, .. }) => {
            assert_eq!(constraint, Constraint::IdentifierUnique);
        }
        other => panic!("expected an identifier violation, got {other:?}"),
    }
}

#[test]
fn test_unknown_model_type_names_the_path() {
    let bytes = document(json!([{ "modelType": "Gadget", "idShort": "g" }]));
    let err = Json::new().read(&bytes).unwrap_err();
    assert!(matches!(err, InterchangeError::UnknownVariant { .. }), "{err:?}");
    assert_eq!(err.path(), Some("submodels/0/submodelElements/g"));
}

#[test]
fn test_failsafe_skips_broken_elements() {
    let bytes = document(json!([
        int_property(json!({})),
        { "modelType": "Gadget", "idShort": "g" },
        { "modelType": "Property", "idShort": "NoType" }
    ]));
    assert!(Json::new().read(&bytes).is_err());

    let env = Json::with_options(CodecOptions::failsafe()).read(&bytes).unwrap();
    let elements = env.submodel("urn:sm:1").unwrap().elements();
    assert_eq!(elements.len(), 1);
    assert!(elements.contains("MaxRpm"));
}

#[test]
fn test_syntax_error_is_a_json_error() {
    let err = Json::new().read(b"{\"submodels\": [").unwrap_err();
    assert!(matches!(err, InterchangeError::Json(_)), "{err:?}");
    assert_eq!(err.path(), None);
}

#[test]
fn test_compact_output() {
    let options = CodecOptions {
        pretty: false,
        ..CodecOptions::default()
    };
    let bytes = Json::with_options(options).write(&motor_environment()).unwrap();
    assert!(!bytes.contains(&b'\n'));
}
