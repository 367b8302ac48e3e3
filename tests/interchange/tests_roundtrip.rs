//! Round trips through both codecs, and between them.

use std::path::Path;

use aas::interchange::{EnvironmentFormat, Json, Xml, detect_format};
use aas::model::{ElementKind, KeyTypes, SubmodelElement, VariableGroup};
use rstest::rstest;

use crate::helpers::*;

fn format(ext: &str) -> Box<dyn EnvironmentFormat> {
    detect_format(Path::new(&format!("motor.{ext}"))).unwrap()
}

#[test]
fn test_fixture_covers_every_element_kind() {
    let kinds = element_kinds(&motor_environment());
    for kind in ElementKind::ALL {
        assert!(kinds.contains(&kind), "fixture has no {kind}");
    }
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_environment_round_trip(#[case] ext: &str) {
    let format = format(ext);
    let env = motor_environment();
    let bytes = format.write(&env).unwrap();
    let decoded = format.read(&bytes).unwrap();
    assert_same_environment(&env, &decoded);
    assert_eq!(element_kinds(&decoded).len(), ElementKind::ALL.len());
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_encoding_is_stable(#[case] ext: &str) {
    let format = format(ext);
    let first = format.write(&motor_environment()).unwrap();
    let second = format.write(&format.read(&first).unwrap()).unwrap();
    assert_eq!(
        String::from_utf8(first).unwrap(),
        String::from_utf8(second).unwrap()
    );
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_identifiable_round_trip(#[case] ext: &str) {
    let format = format(ext);
    let env = motor_environment();
    for item in env.iter() {
        let bytes = format.write_identifiable(item).unwrap();
        let decoded = format.read_identifiable(&bytes).unwrap();
        assert_eq!(decoded.view(), item, "{}", item.identifier());
    }
}

#[test]
fn test_json_to_xml_and_back() {
    let env = motor_environment();
    let via_json = Json::new().read(&Json::new().write(&env).unwrap()).unwrap();
    let via_xml = Xml::new().read(&Xml::new().write(&via_json).unwrap()).unwrap();
    assert_same_environment(&env, &via_xml);
}

#[test]
fn test_xml_to_json_and_back() {
    let env = motor_environment();
    let via_xml = Xml::new().read(&Xml::new().write(&env).unwrap()).unwrap();
    let via_json = Json::new().read(&Json::new().write(&via_xml).unwrap()).unwrap();
    assert_same_environment(&env, &via_json);
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_decoded_graph_has_parent_links(#[case] ext: &str) {
    let format = format(ext);
    let env = format.read(&format.write(&motor_environment()).unwrap()).unwrap();
    assert!(aas::validation::validate(&env).is_empty());

    let submodel = env.submodel(SUBMODEL_ID).unwrap();
    let owner = submodel.elements().owner();
    for element in submodel.elements().iter() {
        assert_eq!(element.parent(), Some(owner), "{:?}", element.id_short());
        for child in element.children() {
            assert_eq!(child.parent(), Some(element.node()));
        }
    }
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_operation_variables_keep_groups_and_order(#[case] ext: &str) {
    let format = format(ext);
    let env = format.read(&format.write(&motor_environment()).unwrap()).unwrap();
    let start = env.submodel(SUBMODEL_ID).unwrap().elements().get("Start").unwrap();
    let SubmodelElement::Operation(start) = start else {
        panic!("Start is a {}", start.kind());
    };
    let names = |group| {
        start
            .variables()
            .group(group)
            .iter()
            .map(|v| v.id_short().unwrap().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(VariableGroup::Input), ["TargetSpeed", "RampTime"]);
    assert_eq!(names(VariableGroup::Output), ["Started"]);
    assert_eq!(names(VariableGroup::InOutput), ["Mode"]);
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_list_items_keep_order(#[case] ext: &str) {
    let format = format(ext);
    let env = format.read(&format.write(&motor_environment()).unwrap()).unwrap();
    let speeds = env
        .submodel(SUBMODEL_ID)
        .unwrap()
        .elements()
        .get("SpeedSteps")
        .unwrap();
    let rendered: Vec<_> = speeds
        .children()
        .map(|item| match item {
            SubmodelElement::Property(p) => p.value().unwrap().render(),
            other => panic!("unexpected {}", other.kind()),
        })
        .collect();
    assert_eq!(rendered, ["750", "1500", "3000"]);
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_references_survive(#[case] ext: &str) {
    let format = format(ext);
    let env = format.read(&format.write(&motor_environment()).unwrap()).unwrap();
    let shell = env.shell(SHELL_ID).unwrap();
    let keys = shell.submodels()[0].keys();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_type(), KeyTypes::Submodel);
    assert_eq!(keys[0].value(), SUBMODEL_ID);

    let speed_ref = env
        .submodel(SUBMODEL_ID)
        .unwrap()
        .elements()
        .get("SpeedRef")
        .unwrap();
    let SubmodelElement::ReferenceElement(speed_ref) = speed_ref else {
        panic!("SpeedRef is a {}", speed_ref.kind());
    };
    let target = speed_ref.value.as_ref().unwrap();
    let resolved = aas::resolve(target, &env).unwrap();
    assert_element_kind(resolved.as_element().unwrap(), ElementKind::Property);
}

#[rstest]
#[case("json")]
#[case("xml")]
fn test_referred_semantic_id_survives(#[case] ext: &str) {
    let format = format(ext);
    let env = format.read(&format.write(&motor_environment()).unwrap()).unwrap();
    let speed_ref = env
        .submodel(SUBMODEL_ID)
        .unwrap()
        .elements()
        .get("SpeedRef")
        .unwrap();
    let SubmodelElement::ReferenceElement(speed_ref) = speed_ref else {
        panic!("SpeedRef is a {}", speed_ref.kind());
    };
    let referred = speed_ref
        .value
        .as_ref()
        .and_then(|r| r.referred_semantic_id())
        .expect("referred semantic id decoded");
    let keys = referred.keys();
    assert_eq!(keys[0].key_type(), KeyTypes::ConceptDescription);
    assert_eq!(keys[0].value(), CONCEPT_ID);
}
