//! A motor described by one shell, one submodel holding every element
//! kind, and one concept description.

use aas::model::*;

pub const SHELL_ID: &str = "https://example.com/ids/aas/motor";
pub const SUBMODEL_ID: &str = "https://example.com/ids/sm/technical-data";
pub const CONCEPT_ID: &str = "https://example.com/ids/cd/max-rotation-speed";
pub const ASSET_ID: &str = "https://example.com/ids/asset/motor-4711";

pub fn key(key_type: KeyTypes, value: &str) -> Key {
    Key::new(key_type, value).unwrap()
}

/// A model reference from the technical-data submodel down `path`.
pub fn element_ref(path: &[(KeyTypes, &str)]) -> Reference {
    let mut keys = vec![key(KeyTypes::Submodel, SUBMODEL_ID)];
    keys.extend(path.iter().map(|(t, v)| key(*t, v)));
    Reference::model(keys).unwrap()
}

pub fn lang(pairs: &[(&str, &str)]) -> LangStringSet {
    LangStringSet::from_pairs(pairs.iter().copied()).unwrap()
}

pub fn concept_description() -> ConceptDescription {
    let mut cd = ConceptDescription::new(Identifier::iri(CONCEPT_ID).unwrap(), "MaxRotationSpeed")
        .unwrap();
    cd.referable.category = Some("PROPERTY".to_string());
    cd.referable.description = lang(&[("en", "Highest permitted speed")]);

    let mut content = DataSpecificationIec61360::new(lang(&[
        ("en", "max rotation speed"),
        ("de", "max. Drehzahl"),
    ]))
    .unwrap();
    content.unit = Some("1/min".to_string());
    content.data_type = Some(DataTypeIec61360::IntegerMeasure);
    content.level_type = Some(LevelType {
        max: true,
        ..LevelType::default()
    });
    content.value_list = Some(
        ValueList::new(vec![ValueReferencePair {
            value: "3000".to_string(),
            value_id: Reference::external("https://example.com/values/3000").unwrap(),
        }])
        .unwrap(),
    );
    cd.embedded_data_specifications.push(EmbeddedDataSpecification {
        data_specification: Reference::external(
            "https://admin-shell.io/DataSpecificationTemplates/DataSpecificationIEC61360/3/0",
        )
        .unwrap(),
        content: DataSpecificationContent::Iec61360(content),
    });
    cd
}

pub fn shell() -> AssetAdministrationShell {
    let mut serial = SpecificAssetId::new("SerialNumber", "4711").unwrap();
    serial.external_subject_id = Some(Reference::external("https://example.com/ids/maker").unwrap());
    let mut info = AssetInformation::new(AssetKind::Instance, Some(ASSET_ID), vec![serial]).unwrap();
    info.default_thumbnail = Some(Resource {
        path: "file:///thumbnail.png".to_string(),
        content_type: Some("image/png".to_string()),
    });

    let mut shell = AssetAdministrationShell::new(Identifier::iri(SHELL_ID).unwrap(), "Motor", info)
        .unwrap();
    shell.administration = Some(AdministrativeInformation::new(Some("1"), Some("0")).unwrap());
    shell.referable.display_name = lang(&[("en", "Motor"), ("de", "Motor")]);
    shell
        .add_submodel(Reference::to_identifiable(KeyTypes::Submodel, SUBMODEL_ID).unwrap())
        .unwrap();
    shell
}

fn property(id_short: &str, value_type: DataTypeDefXsd, value: &str) -> SubmodelElement {
    Property::new(id_short, value_type, Some(value)).unwrap().into()
}

pub fn submodel() -> Submodel {
    let mut sm = Submodel::new(Identifier::iri(SUBMODEL_ID).unwrap(), "TechnicalData").unwrap();
    sm.kind = Some(ModellingKind::Instance);
    sm.common.semantic_id =
        Some(Reference::external("https://admin-shell.io/ZVEI/TechnicalData/Submodel/1/2").unwrap());
    sm.common
        .referable
        .add_extension(Extension::new("vendor.revision", Some(DataTypeDefXsd::Int), Some("3")).unwrap())
        .unwrap();
    let elements = sm.elements_mut();

    let mut max_speed = Property::new("MaxRotationSpeed", DataTypeDefXsd::Int, Some("5000")).unwrap();
    max_speed.common.semantic_id =
        Some(Reference::to_identifiable(KeyTypes::ConceptDescription, CONCEPT_ID).unwrap());
    let mut tolerance = Qualifier::new("tolerance", DataTypeDefXsd::Int, Some("12")).unwrap();
    tolerance.kind = Some(QualifierKind::ValueQualifier);
    max_speed.common.add_qualifier(tolerance).unwrap();
    elements.add(max_speed.into()).unwrap();

    elements
        .add(
            MultiLanguageProperty::new("Name", lang(&[("en", "Motor"), ("de", "Motor")]))
                .unwrap()
                .into(),
        )
        .unwrap();
    elements
        .add(
            Range::new("Temperature", DataTypeDefXsd::Double, Some("-20"), Some("80.5"))
                .unwrap()
                .into(),
        )
        .unwrap();
    elements
        .add(
            Blob::new("Thumbnail", "image/png", Some(vec![0x89, b'P', b'N', b'G', 0, 1]))
                .unwrap()
                .into(),
        )
        .unwrap();
    elements
        .add(
            File::new("Manual", "application/pdf", Some("/aasx/manual.pdf"))
                .unwrap()
                .into(),
        )
        .unwrap();
    elements
        .add(
            ReferenceElement::new(
                "SpeedRef",
                Some(
                    element_ref(&[(KeyTypes::Property, "MaxRotationSpeed")]).with_referred_semantic_id(
                        Reference::to_identifiable(KeyTypes::ConceptDescription, CONCEPT_ID).unwrap(),
                    ),
                ),
            )
            .unwrap()
            .into(),
        )
        .unwrap();
    elements
        .add(
            RelationshipElement::new(
                "Drives",
                element_ref(&[(KeyTypes::Entity, "Bearing")]),
                Reference::external("https://example.com/ids/asset/pump").unwrap(),
            )
            .unwrap()
            .into(),
        )
        .unwrap();

    let mut coupled = AnnotatedRelationshipElement::new(
        "CoupledWith",
        element_ref(&[(KeyTypes::Entity, "Bearing")]),
        element_ref(&[(KeyTypes::File, "Manual")]),
    )
    .unwrap();
    coupled
        .annotations_mut()
        .add(property("Torque", DataTypeDefXsd::Decimal, "12.75"))
        .unwrap();
    elements.add(coupled.into()).unwrap();

    let mut electrical = SubmodelElementCollection::new("Electrical").unwrap();
    electrical
        .elements_mut()
        .add(property("Voltage", DataTypeDefXsd::Decimal, "230.5"))
        .unwrap();
    electrical
        .elements_mut()
        .add(property("Phases", DataTypeDefXsd::UnsignedByte, "3"))
        .unwrap();
    elements.add(electrical.into()).unwrap();

    let mut documents =
        SubmodelElementList::new("Documents", AasSubmodelElements::File, None).unwrap();
    for path in ["/aasx/datasheet.pdf", "/aasx/certificate.pdf"] {
        documents
            .items_mut()
            .push(File::new(None, "application/pdf", Some(path)).unwrap().into())
            .unwrap();
    }
    elements.add(documents.into()).unwrap();

    let mut speeds =
        SubmodelElementList::new("SpeedSteps", AasSubmodelElements::Property, Some(DataTypeDefXsd::Int))
            .unwrap();
    for value in ["750", "1500", "3000"] {
        speeds
            .items_mut()
            .push(Property::new(None, DataTypeDefXsd::Int, Some(value)).unwrap().into())
            .unwrap();
    }
    elements.add(speeds.into()).unwrap();

    let mut start = Operation::new("Start").unwrap();
    let variables = start.variables_mut();
    variables
        .add(VariableGroup::Input, property("TargetSpeed", DataTypeDefXsd::Int, "1500"))
        .unwrap();
    variables
        .add(VariableGroup::Input, property("RampTime", DataTypeDefXsd::Double, "2.5"))
        .unwrap();
    variables
        .add(VariableGroup::Output, property("Started", DataTypeDefXsd::Boolean, "true"))
        .unwrap();
    variables
        .add(VariableGroup::InOutput, property("Mode", DataTypeDefXsd::String, "auto"))
        .unwrap();
    elements.add(start.into()).unwrap();

    elements.add(Capability::new("CanRotate").unwrap().into()).unwrap();

    let mut bearing = Entity::new(
        "Bearing",
        EntityType::SelfManagedEntity,
        Some("https://example.com/ids/asset/bearing-17"),
        Vec::new(),
    )
    .unwrap();
    bearing
        .statements_mut()
        .add(property("Lubricated", DataTypeDefXsd::Boolean, "false"))
        .unwrap();
    elements.add(bearing.into()).unwrap();

    let mut overheat = BasicEventElement::new(
        "Overheat",
        element_ref(&[(KeyTypes::Range, "Temperature")]),
        Direction::Output,
        StateOfEvent::On,
    )
    .unwrap();
    overheat.message_topic = Some("motor/overheat".to_string());
    overheat.last_update = Some("2024-03-01T12:00:00Z".to_string());
    overheat.min_interval = Some("PT1S".to_string());
    elements.add(overheat.into()).unwrap();

    sm
}

/// The shell, the technical-data submodel and the concept description.
pub fn motor_environment() -> Environment {
    let mut env = Environment::new();
    env.insert(shell()).unwrap();
    env.insert(submodel()).unwrap();
    env.insert(concept_description()).unwrap();
    env
}
