//! Whole-graph validation after mutation.

use aas::model::{
    AasSubmodelElements, Constraint, DataTypeDefXsd, Property, SubmodelElement,
    SubmodelElementCollection, SubmodelElementList,
};
use aas::validation::validate;

use crate::helpers::*;

#[test]
fn test_fixture_is_valid() {
    let violations = validate(&motor_environment());
    assert!(violations.is_empty(), "{violations:?}");
}

fn named_property() -> SubmodelElement {
    Property::new("Speed", DataTypeDefXsd::Int, Some("12"))
        .unwrap()
        .into()
}

#[test]
fn test_collection_rejects_shared_id_short() {
    let mut collection = SubmodelElementCollection::new("Speeds").unwrap();
    collection.elements_mut().add(named_property()).unwrap();
    let err = collection.elements_mut().add(named_property()).unwrap_err();
    assert_eq!(err.constraint(), Some(Constraint::IdShortUnique));
}

#[test]
fn test_list_admits_shared_id_short() {
    let mut list = SubmodelElementList::new(
        "Speeds",
        AasSubmodelElements::Property,
        Some(DataTypeDefXsd::Int),
    )
    .unwrap();
    list.items_mut().push(named_property()).unwrap();
    list.items_mut().push(named_property()).unwrap();
    assert_eq!(list.items().len(), 2);
}

#[test]
fn test_event_timestamps_are_checked() {
    let mut env = motor_environment();
    let overheat = env
        .submodel_mut(SUBMODEL_ID)
        .unwrap()
        .elements_mut()
        .get_mut("Overheat")
        .unwrap();
    let SubmodelElement::BasicEventElement(overheat) = overheat else {
        panic!("Overheat is a {}", overheat.kind());
    };
    overheat.last_update = Some("yesterday".to_string());
    overheat.max_interval = Some("10 seconds".to_string());

    let violations = validate(&env);
    assert_eq!(violations.len(), 2);
    assert!(violations.iter().all(|v| v.invariant == Constraint::ValueTypeAgreement));
    assert_eq!(violations[0].path, format!("{SUBMODEL_ID}/Overheat"));
}

#[test]
fn test_moved_element_is_clean() {
    let mut env = motor_environment();
    let SubmodelElement::SubmodelElementCollection(electrical) =
        submodel_child(&mut env, "Electrical")
    else {
        panic!("Electrical is not a collection");
    };
    let voltage = electrical.elements_mut().remove("Voltage").unwrap();
    assert_eq!(voltage.parent(), None);
    env.submodel_mut(SUBMODEL_ID)
        .unwrap()
        .elements_mut()
        .add(voltage)
        .unwrap();
    assert!(validate(&env).is_empty());
}

#[test]
fn test_overwritten_child_lacks_parent_link() {
    let mut env = motor_environment();
    let SubmodelElement::SubmodelElementCollection(electrical) =
        submodel_child(&mut env, "Electrical")
    else {
        panic!("Electrical is not a collection");
    };
    let slot = electrical.elements_mut().get_mut("Voltage").unwrap();
    *slot = Property::new("Voltage", DataTypeDefXsd::Decimal, Some("400"))
        .unwrap()
        .into();

    let violations = validate(&env);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].invariant, Constraint::ParentConsistency);
    assert_eq!(violations[0].path, format!("{SUBMODEL_ID}/Electrical/Voltage"));
}

#[test]
fn test_renamed_child_is_misfiled() {
    let mut env = motor_environment();
    let slot = submodel_child(&mut env, "Manual");
    let parent = slot.parent();
    let mut renamed: SubmodelElement = aas::model::File::new("Handbook", "application/pdf", None)
        .unwrap()
        .into();
    std::mem::swap(slot, &mut renamed);
    assert_eq!(renamed.parent(), parent);

    let violations = validate(&env);
    assert!(
        violations
            .iter()
            .any(|v| v.invariant == Constraint::IdShortUnique && v.path.ends_with("/Manual"))
    );
}

fn submodel_child<'a>(env: &'a mut aas::Environment, id_short: &str) -> &'a mut SubmodelElement {
    env.submodel_mut(SUBMODEL_ID)
        .unwrap()
        .elements_mut()
        .get_mut(id_short)
        .unwrap()
}
