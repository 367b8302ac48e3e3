//! Identifier generation against a populated namespace.

use aas::identification::{IdentifierGenerator, NamespaceIriGenerator, UuidGenerator};
use aas::model::{Identifier, Submodel};

use crate::helpers::*;

#[test]
fn test_generated_ids_avoid_existing_identifiables() {
    let mut env = motor_environment();
    let mut generator = NamespaceIriGenerator::new("https://example.com/ids/sm/").unwrap();

    let id = generator.generate_id(Some("technical-data"), &env).unwrap();
    assert_ne!(id.id(), SUBMODEL_ID);
    assert_eq!(id.id(), "https://example.com/ids/sm/technical-data_0001");

    env.insert(Submodel::new(id, "TechnicalDataCopy").unwrap()).unwrap();
    let next = generator.generate_id(Some("technical-data"), &env).unwrap();
    assert_eq!(next.id(), "https://example.com/ids/sm/technical-data_0002");
}

#[test]
fn test_proposals_are_quoted() {
    let env = motor_environment();
    let mut generator = NamespaceIriGenerator::new("urn:example:ids#").unwrap();
    let id = generator.generate_id(Some("Motor (spare)"), &env).unwrap();
    assert_eq!(id.id(), "urn:example:ids#Motor%20%28spare%29");
}

#[test]
fn test_generators_are_interchangeable() {
    let env = motor_environment();
    let mut generators: Vec<Box<dyn IdentifierGenerator>> = vec![
        Box::new(UuidGenerator),
        Box::new(NamespaceIriGenerator::new("https://example.com/ids/").unwrap()),
    ];
    for generator in &mut generators {
        let id: Identifier = generator.generate_id(Some("pump"), &env).unwrap();
        assert!(!env.contains(id.id()));
    }
}
