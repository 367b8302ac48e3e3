//! Assertions over decoded graphs.

use aas::model::{ElementKind, Environment, SubmodelElement};
use rustc_hash::FxHashSet;

fn collect_kinds(element: &SubmodelElement, kinds: &mut FxHashSet<ElementKind>) {
    kinds.insert(element.kind());
    for child in element.children() {
        collect_kinds(child, kinds);
    }
}

/// Every element kind that occurs anywhere in `env`.
pub fn element_kinds(env: &Environment) -> FxHashSet<ElementKind> {
    let mut kinds = FxHashSet::default();
    for submodel in env.submodels() {
        for element in submodel.elements().iter() {
            collect_kinds(element, &mut kinds);
        }
    }
    kinds
}

/// Assert two environments are equal, naming the first identifiable that differs.
pub fn assert_same_environment(expected: &Environment, actual: &Environment) {
    for item in expected.iter() {
        let id = item.identifier().id();
        let found = actual
            .get(id)
            .unwrap_or_else(|| panic!("Expected identifiable '{}' to survive", id));
        assert_eq!(item, found, "Identifiable '{}' changed", id);
    }
    assert_eq!(expected.len(), actual.len(), "Unexpected extra identifiables");
    assert_eq!(expected, actual);
}

/// Assert a decoded submodel element's kind.
pub fn assert_element_kind(element: &SubmodelElement, expected: ElementKind) {
    assert_eq!(
        element.kind(),
        expected,
        "Expected element {:?} to be a {}, got {}",
        element.id_short(),
        expected,
        element.kind()
    );
}
