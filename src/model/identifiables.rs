//! Identifiable entities: shells, submodels and concept descriptions.

use super::containers::NamedElements;
use super::data_spec::EmbeddedDataSpecification;
use super::error::{Constraint, ModelError};
use super::reference::{KeyTypes, Reference};
use super::referable::{
    AdministrativeInformation, Capabilities, ElementCommon, Identifier, ReferableData,
};

/// Whether a submodel is a template or an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModellingKind {
    Template,
    Instance,
}

impl ModellingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "Template",
            Self::Instance => "Instance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Template" => Some(Self::Template),
            "Instance" => Some(Self::Instance),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Type,
    Instance,
    NotApplicable,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Instance => "Instance",
            Self::NotApplicable => "NotApplicable",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Type" => Some(Self::Type),
            "Instance" => Some(Self::Instance),
            "NotApplicable" => Some(Self::NotApplicable),
            _ => None,
        }
    }
}

/// A name/value pair identifying an asset within some subject's context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpecificAssetId {
    name: String,
    value: String,
    pub external_subject_id: Option<Reference>,
    pub semantic_id: Option<Reference>,
    pub supplemental_semantic_ids: Vec<Reference>,
}

impl SpecificAssetId {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, ModelError> {
        let (name, value) = (name.into(), value.into());
        if name.is_empty() || value.is_empty() {
            return Err(ModelError::violation(
                Constraint::NonEmptyString,
                "specific asset id needs a name and a value",
            ));
        }
        Ok(Self {
            name,
            value,
            external_subject_id: None,
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A thumbnail or other file resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub path: String,
    pub content_type: Option<String>,
}

/// What asset a shell describes.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetInformation {
    pub asset_kind: AssetKind,
    global_asset_id: Option<String>,
    specific_asset_ids: Vec<SpecificAssetId>,
    pub asset_type: Option<String>,
    pub default_thumbnail: Option<Resource>,
}

impl AssetInformation {
    /// At least one of the asset ids must be given.
    pub fn new(
        asset_kind: AssetKind,
        global_asset_id: Option<&str>,
        specific_asset_ids: Vec<SpecificAssetId>,
    ) -> Result<Self, ModelError> {
        if global_asset_id.is_none() && specific_asset_ids.is_empty() {
            return Err(ModelError::violation(
                Constraint::AssetInformationAssetId,
                "asset information needs a global or specific asset id",
            ));
        }
        Ok(Self {
            asset_kind,
            global_asset_id: global_asset_id.map(str::to_string),
            specific_asset_ids,
            asset_type: None,
            default_thumbnail: None,
        })
    }

    pub fn global_asset_id(&self) -> Option<&str> {
        self.global_asset_id.as_deref()
    }

    pub fn specific_asset_ids(&self) -> &[SpecificAssetId] {
        &self.specific_asset_ids
    }
}

// ============================================================================
// SUBMODEL
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Submodel {
    pub common: ElementCommon,
    identifier: Identifier,
    pub administration: Option<AdministrativeInformation>,
    pub kind: Option<ModellingKind>,
    elements: NamedElements,
}

impl Submodel {
    pub fn new<'a>(
        identifier: Identifier,
        id_short: impl Into<Option<&'a str>>,
    ) -> Result<Self, ModelError> {
        let common = ElementCommon::new(id_short.into())?;
        let elements = NamedElements::new(common.referable.node());
        Ok(Self {
            common,
            identifier,
            administration: None,
            kind: None,
            elements,
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn id(&self) -> &str {
        self.identifier.id()
    }

    pub fn elements(&self) -> &NamedElements {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut NamedElements {
        &mut self.elements
    }
}

// ============================================================================
// SHELL
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct AssetAdministrationShell {
    pub referable: ReferableData,
    identifier: Identifier,
    pub administration: Option<AdministrativeInformation>,
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    pub derived_from: Option<Reference>,
    pub asset_information: AssetInformation,
    submodels: Vec<Reference>,
}

impl AssetAdministrationShell {
    pub fn new<'a>(
        identifier: Identifier,
        id_short: impl Into<Option<&'a str>>,
        asset_information: AssetInformation,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            referable: ReferableData::new(id_short.into())?,
            identifier,
            administration: None,
            embedded_data_specifications: Vec::new(),
            derived_from: None,
            asset_information,
            submodels: Vec::new(),
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn id(&self) -> &str {
        self.identifier.id()
    }

    pub fn submodels(&self) -> &[Reference] {
        &self.submodels
    }

    /// Attach a submodel reference, a model reference with one Submodel key.
    pub fn add_submodel(&mut self, reference: Reference) -> Result<(), ModelError> {
        let Some(id) = submodel_id(&reference) else {
            return Err(ModelError::violation(
                Constraint::SubmodelReference,
                "shell submodel references must address a single submodel",
            ));
        };
        if self.find_submodel(id).is_some() {
            return Err(ModelError::violation(
                Constraint::IdentifierUnique,
                format!("submodel `{id}` is already referenced"),
            ));
        }
        self.submodels.push(reference);
        Ok(())
    }

    pub fn find_submodel(&self, id: &str) -> Option<&Reference> {
        self.submodels.iter().find(|r| submodel_id(r) == Some(id))
    }

    pub fn remove_submodel(&mut self, id: &str) -> Option<Reference> {
        let index = self.submodels.iter().position(|r| submodel_id(r) == Some(id))?;
        Some(self.submodels.remove(index))
    }
}

/// The submodel identifier a shell reference points at.
pub(crate) fn submodel_id(reference: &Reference) -> Option<&str> {
    match reference.as_model()?.keys() {
        [key] if key.key_type() == KeyTypes::Submodel => Some(key.value()),
        _ => None,
    }
}

// ============================================================================
// CONCEPT DESCRIPTION
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct ConceptDescription {
    pub referable: ReferableData,
    identifier: Identifier,
    pub administration: Option<AdministrativeInformation>,
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
    pub is_case_of: Vec<Reference>,
}

impl ConceptDescription {
    pub fn new<'a>(
        identifier: Identifier,
        id_short: impl Into<Option<&'a str>>,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            referable: ReferableData::new(id_short.into())?,
            identifier,
            administration: None,
            embedded_data_specifications: Vec::new(),
            is_case_of: Vec::new(),
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn id(&self) -> &str {
        self.identifier.id()
    }
}

// ============================================================================
// SUM TYPES
// ============================================================================

/// Any identifiable, owned.
#[derive(Clone, Debug, PartialEq)]
pub enum Identifiable {
    Shell(AssetAdministrationShell),
    Submodel(Submodel),
    ConceptDescription(ConceptDescription),
}

impl From<AssetAdministrationShell> for Identifiable {
    fn from(v: AssetAdministrationShell) -> Self {
        Self::Shell(v)
    }
}

impl From<Submodel> for Identifiable {
    fn from(v: Submodel) -> Self {
        Self::Submodel(v)
    }
}

impl From<ConceptDescription> for Identifiable {
    fn from(v: ConceptDescription) -> Self {
        Self::ConceptDescription(v)
    }
}

impl Identifiable {
    pub fn view(&self) -> IdentifiableRef<'_> {
        match self {
            Self::Shell(s) => IdentifiableRef::Shell(s),
            Self::Submodel(s) => IdentifiableRef::Submodel(s),
            Self::ConceptDescription(c) => IdentifiableRef::ConceptDescription(c),
        }
    }

    pub fn id(&self) -> &str {
        self.view().identifier().id()
    }

    pub fn key_type(&self) -> KeyTypes {
        self.view().key_type()
    }
}

/// Any identifiable, borrowed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IdentifiableRef<'a> {
    Shell(&'a AssetAdministrationShell),
    Submodel(&'a Submodel),
    ConceptDescription(&'a ConceptDescription),
}

impl<'a> IdentifiableRef<'a> {
    pub fn identifier(&self) -> &'a Identifier {
        match self {
            Self::Shell(s) => s.identifier(),
            Self::Submodel(s) => s.identifier(),
            Self::ConceptDescription(c) => c.identifier(),
        }
    }

    pub fn referable(&self) -> &'a ReferableData {
        match self {
            Self::Shell(s) => &s.referable,
            Self::Submodel(s) => &s.common.referable,
            Self::ConceptDescription(c) => &c.referable,
        }
    }

    pub fn key_type(&self) -> KeyTypes {
        match self {
            Self::Shell(_) => KeyTypes::AssetAdministrationShell,
            Self::Submodel(_) => KeyTypes::Submodel,
            Self::ConceptDescription(_) => KeyTypes::ConceptDescription,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Submodel(_) => Capabilities::ALL,
            Self::Shell(_) | Self::ConceptDescription(_) => Capabilities::DATA_SPECIFICATIONS,
        }
    }

    pub fn to_owned(&self) -> Identifiable {
        match self {
            Self::Shell(s) => Identifiable::Shell((*s).clone()),
            Self::Submodel(s) => Identifiable::Submodel((*s).clone()),
            Self::ConceptDescription(c) => Identifiable::ConceptDescription((*c).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::reference::Key;

    #[test]
    fn test_asset_information_needs_asset_id() {
        let err = AssetInformation::new(AssetKind::Instance, None, vec![]).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::AssetInformationAssetId));
        let specific = SpecificAssetId::new("serial", "4711").unwrap();
        assert!(AssetInformation::new(AssetKind::Instance, None, vec![specific]).is_ok());
    }

    #[test]
    fn test_shell_submodel_references() {
        let info = AssetInformation::new(AssetKind::Type, Some("urn:asset"), vec![]).unwrap();
        let mut shell =
            AssetAdministrationShell::new(Identifier::iri("urn:aas").unwrap(), "shell", info).unwrap();
        let sm = Reference::to_identifiable(KeyTypes::Submodel, "urn:sm").unwrap();
        shell.add_submodel(sm.clone()).unwrap();
        assert!(shell.add_submodel(sm).is_err());
        assert!(shell.find_submodel("urn:sm").is_some());

        let cd = Reference::model(vec![Key::new(KeyTypes::ConceptDescription, "urn:cd").unwrap()]).unwrap();
        let err = shell.add_submodel(cd).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::SubmodelReference));

        assert!(shell.remove_submodel("urn:sm").is_some());
        assert!(shell.submodels().is_empty());
    }

    #[test]
    fn test_capabilities_by_kind() {
        let sm = Submodel::new(Identifier::iri("urn:sm").unwrap(), "sm").unwrap();
        let cd = ConceptDescription::new(Identifier::iri("urn:cd").unwrap(), "cd").unwrap();
        assert_eq!(IdentifiableRef::Submodel(&sm).capabilities(), Capabilities::ALL);
        let cd_caps = IdentifiableRef::ConceptDescription(&cd).capabilities();
        assert!(cd_caps.data_specifications);
        assert!(!cd_caps.qualifiers && !cd_caps.semantic_id);
    }
}
