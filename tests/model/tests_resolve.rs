//! Resolution of model references against the motor fixture.

use aas::model::{ElementKind, KeyTypes, Reference};
use aas::resolve::{ResolutionError, Resolved, resolve};
use indexmap::IndexMap;
use rstest::rstest;

use crate::helpers::*;

#[rstest]
#[case(&[(KeyTypes::Property, "MaxRotationSpeed")], ElementKind::Property)]
#[case(&[(KeyTypes::DataElement, "Name")], ElementKind::MultiLanguageProperty)]
#[case(&[(KeyTypes::SubmodelElementCollection, "Electrical"), (KeyTypes::Property, "Voltage")], ElementKind::Property)]
#[case(&[(KeyTypes::SubmodelElementList, "Documents"), (KeyTypes::File, "1")], ElementKind::File)]
#[case(&[(KeyTypes::Entity, "Bearing"), (KeyTypes::Property, "Lubricated")], ElementKind::Property)]
#[case(&[(KeyTypes::RelationshipElement, "CoupledWith"), (KeyTypes::Property, "Torque")], ElementKind::Property)]
#[case(&[(KeyTypes::EventElement, "Overheat")], ElementKind::BasicEventElement)]
#[case(&[(KeyTypes::File, "Manual"), (KeyTypes::FragmentReference, "page=3")], ElementKind::File)]
#[case(&[(KeyTypes::SubmodelElement, "Start")], ElementKind::Operation)]
#[case(&[(KeyTypes::Operation, "Start"), (KeyTypes::Property, "TargetSpeed")], ElementKind::Property)]
#[case(&[(KeyTypes::Operation, "Start"), (KeyTypes::DataElement, "Started")], ElementKind::Property)]
#[case(&[(KeyTypes::SubmodelElement, "Start"), (KeyTypes::Property, "Mode")], ElementKind::Property)]
fn test_resolves_element(#[case] path: &[(KeyTypes, &str)], #[case] expected: ElementKind) {
    let env = motor_environment();
    let reference = element_ref(path);
    let resolved = resolve(&reference, &env).unwrap();
    assert_element_kind(resolved.as_element().unwrap(), expected);
}

#[test]
fn test_resolves_identifiables() {
    let env = motor_environment();
    for (key_type, id) in [
        (KeyTypes::AssetAdministrationShell, SHELL_ID),
        (KeyTypes::Submodel, SUBMODEL_ID),
        (KeyTypes::ConceptDescription, CONCEPT_ID),
        (KeyTypes::Identifiable, CONCEPT_ID),
    ] {
        let reference = Reference::to_identifiable(key_type, id).unwrap();
        let resolved = resolve(&reference, &env).unwrap();
        assert_eq!(resolved.as_identifiable().unwrap().identifier().id(), id);
    }
}

#[test]
fn test_external_reference_is_not_followed() {
    let env = motor_environment();
    let reference = Reference::external("https://example.com/ids/asset/pump").unwrap();
    assert!(matches!(resolve(&reference, &env), Ok(Resolved::External(_))));
}

#[test]
fn test_list_index_out_of_range() {
    let env = motor_environment();
    let reference = element_ref(&[
        (KeyTypes::SubmodelElementList, "Documents"),
        (KeyTypes::File, "2"),
    ]);
    match resolve(&reference, &env) {
        Err(ResolutionError::BrokenReferenceChain { index, .. }) => assert_eq!(index, 2),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_wrong_key_type_breaks_chain() {
    let env = motor_environment();
    let reference = element_ref(&[(KeyTypes::Blob, "MaxRotationSpeed")]);
    match resolve(&reference, &env) {
        Err(ResolutionError::BrokenReferenceChain { index, reason, .. }) => {
            assert_eq!(index, 1);
            assert!(reason.contains("Property"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_identifier_kind_mismatch() {
    let env = motor_environment();
    let reference = Reference::to_identifiable(KeyTypes::Submodel, CONCEPT_ID).unwrap();
    assert!(matches!(
        resolve(&reference, &env),
        Err(ResolutionError::BrokenReferenceChain { index: 0, .. })
    ));
}

#[test]
fn test_resolves_against_plain_map() {
    let env = motor_environment();
    let namespace: IndexMap<String, aas::Identifiable> = env
        .iter()
        .map(|i| (i.identifier().id().to_string(), i.to_owned()))
        .collect();
    let reference = element_ref(&[(KeyTypes::Range, "Temperature")]);
    let resolved = resolve(&reference, &namespace).unwrap();
    assert_element_kind(resolved.as_element().unwrap(), ElementKind::Range);
}

#[test]
fn test_unknown_identifier() {
    let env = motor_environment();
    let reference = Reference::to_identifiable(KeyTypes::Submodel, "urn:nowhere").unwrap();
    assert_eq!(
        resolve(&reference, &env),
        Err(ResolutionError::IdentifierNotFound {
            id: "urn:nowhere".to_string()
        })
    );
}

#[test]
fn test_missing_operation_variable_breaks_chain() {
    let env = motor_environment();
    let reference = element_ref(&[(KeyTypes::Operation, "Start"), (KeyTypes::Property, "Torque")]);
    match resolve(&reference, &env) {
        Err(ResolutionError::BrokenReferenceChain { index, reason, .. }) => {
            assert_eq!(index, 2);
            assert_eq!(reason, "no such child");
        }
        other => panic!("unexpected {other:?}"),
    }
}
