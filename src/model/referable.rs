//! Referable and Identifiable building blocks shared by every entity.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use super::data_spec::EmbeddedDataSpecification;
use super::error::{Constraint, ModelError};
use super::lang::LangStringSet;
use super::reference::Reference;
use super::value::{DataTypeDefXsd, Value};

static ID_SHORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z]([a-zA-Z0-9_-]*[a-zA-Z0-9_])?$")
        .unwrap_or_else(|e| panic!("invalid id-short grammar: {e}"))
});

const ID_SHORT_MAX_LEN: usize = 128;

/// Check an id-short against the identifier-like grammar.
pub fn check_id_short(id_short: &str) -> Result<(), ModelError> {
    if id_short.len() > ID_SHORT_MAX_LEN || !ID_SHORT.is_match(id_short) {
        return Err(ModelError::violation(
            Constraint::IdShortSyntax,
            format!("`{id_short}` is not a valid id-short"),
        ));
    }
    Ok(())
}

// ============================================================================
// NODE IDENTITY
// ============================================================================

/// Process-local identity of a graph node.
///
/// Parents are recorded by node id rather than by pointer, so the
/// containment tree owns its children and a detached child never dangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which of the optional metamodel capabilities an entity carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub qualifiers: bool,
    pub semantic_id: bool,
    pub data_specifications: bool,
}

impl Capabilities {
    pub const ALL: Self = Self {
        qualifiers: true,
        semantic_id: true,
        data_specifications: true,
    };

    pub const DATA_SPECIFICATIONS: Self = Self {
        qualifiers: false,
        semantic_id: false,
        data_specifications: true,
    };
}

// ============================================================================
// REFERABLE
// ============================================================================

/// Fields every referable entity carries.
#[derive(Clone, Debug)]
pub struct ReferableData {
    id_short: Option<String>,
    pub category: Option<String>,
    pub display_name: LangStringSet,
    pub description: LangStringSet,
    extensions: Vec<Extension>,
    node: NodeId,
    parent: Option<NodeId>,
}

impl ReferableData {
    pub fn new(id_short: Option<&str>) -> Result<Self, ModelError> {
        if let Some(id_short) = id_short {
            check_id_short(id_short)?;
        }
        Ok(Self {
            id_short: id_short.map(str::to_string),
            category: None,
            display_name: LangStringSet::new(),
            description: LangStringSet::new(),
            extensions: Vec::new(),
            node: NodeId::new(),
            parent: None,
        })
    }

    pub fn id_short(&self) -> Option<&str> {
        self.id_short.as_deref()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The container this entity was added to, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name == name)
    }

    /// Attach an extension; names are unique per referable.
    pub fn add_extension(&mut self, extension: Extension) -> Result<(), ModelError> {
        if self.extension(&extension.name).is_some() {
            return Err(ModelError::violation(
                Constraint::ExtensionNameUnique,
                format!("extension `{}` already present", extension.name),
            ));
        }
        self.extensions.push(extension);
        Ok(())
    }

    pub fn remove_extension(&mut self, name: &str) -> Option<Extension> {
        let index = self.extensions.iter().position(|e| e.name == name)?;
        Some(self.extensions.remove(index))
    }
}

impl PartialEq for ReferableData {
    // node identity and parent links are not part of the value
    fn eq(&self, other: &Self) -> bool {
        self.id_short == other.id_short
            && self.category == other.category
            && self.display_name == other.display_name
            && self.description == other.description
            && self.extensions == other.extensions
    }
}

/// Fields shared by submodels and submodel elements: referable data plus
/// semantic id, qualifiers and embedded data specifications.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementCommon {
    pub referable: ReferableData,
    pub semantic_id: Option<Reference>,
    pub supplemental_semantic_ids: Vec<Reference>,
    qualifiers: Vec<Qualifier>,
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
}

impl ElementCommon {
    pub fn new(id_short: Option<&str>) -> Result<Self, ModelError> {
        Ok(Self {
            referable: ReferableData::new(id_short)?,
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
            qualifiers: Vec::new(),
            embedded_data_specifications: Vec::new(),
        })
    }

    pub fn id_short(&self) -> Option<&str> {
        self.referable.id_short()
    }

    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    pub fn qualifier(&self, qualifier_type: &str) -> Option<&Qualifier> {
        self.qualifiers
            .iter()
            .find(|q| q.qualifier_type == qualifier_type)
    }

    /// Attach a qualifier; qualifier types are unique per element.
    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> Result<(), ModelError> {
        if self.qualifier(&qualifier.qualifier_type).is_some() {
            return Err(ModelError::violation(
                Constraint::QualifierTypeUnique,
                format!("qualifier `{}` already present", qualifier.qualifier_type),
            ));
        }
        self.qualifiers.push(qualifier);
        Ok(())
    }

    pub fn remove_qualifier(&mut self, qualifier_type: &str) -> Option<Qualifier> {
        let index = self
            .qualifiers
            .iter()
            .position(|q| q.qualifier_type == qualifier_type)?;
        Some(self.qualifiers.remove(index))
    }
}

// ============================================================================
// IDENTIFIABLE
// ============================================================================

/// How an identifier string is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum IdentifierKind {
    #[default]
    Iri,
    Irdi,
    Custom,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Iri => "IRI",
            Self::Irdi => "IRDI",
            Self::Custom => "Custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "IRI" => Some(Self::Iri),
            "IRDI" => Some(Self::Irdi),
            "Custom" | "CUSTOM" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A globally unique identifier. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identifier {
    id: String,
    kind: IdentifierKind,
}

impl Identifier {
    pub fn new(id: impl Into<String>, kind: IdentifierKind) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::violation(
                Constraint::IdentifierNonEmpty,
                "identifier is empty",
            ));
        }
        Ok(Self { id, kind })
    }

    pub fn iri(id: impl Into<String>) -> Result<Self, ModelError> {
        Self::new(id, IdentifierKind::Iri)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Version metadata of an identifiable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdministrativeInformation {
    version: Option<String>,
    revision: Option<String>,
    pub creator: Option<Reference>,
    pub template_id: Option<String>,
    pub embedded_data_specifications: Vec<EmbeddedDataSpecification>,
}

impl AdministrativeInformation {
    pub fn new(version: Option<&str>, revision: Option<&str>) -> Result<Self, ModelError> {
        if revision.is_some() && version.is_none() {
            return Err(ModelError::violation(
                Constraint::AdministrationVersion,
                "a revision requires a version",
            ));
        }
        Ok(Self {
            version: version.map(str::to_string),
            revision: revision.map(str::to_string),
            ..Self::default()
        })
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }
}

// ============================================================================
// QUALIFIERS AND EXTENSIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QualifierKind {
    ValueQualifier,
    ConceptQualifier,
    TemplateQualifier,
}

impl QualifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValueQualifier => "ValueQualifier",
            Self::ConceptQualifier => "ConceptQualifier",
            Self::TemplateQualifier => "TemplateQualifier",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ValueQualifier" => Some(Self::ValueQualifier),
            "ConceptQualifier" => Some(Self::ConceptQualifier),
            "TemplateQualifier" => Some(Self::TemplateQualifier),
            _ => None,
        }
    }
}

/// A typed semantic annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Qualifier {
    qualifier_type: String,
    value_type: DataTypeDefXsd,
    value: Option<Value>,
    pub kind: Option<QualifierKind>,
    pub value_id: Option<Reference>,
    pub semantic_id: Option<Reference>,
    pub supplemental_semantic_ids: Vec<Reference>,
}

impl Qualifier {
    /// Create a qualifier, parsing `value` under `value_type`.
    pub fn new(
        qualifier_type: impl Into<String>,
        value_type: DataTypeDefXsd,
        value: Option<&str>,
    ) -> Result<Self, ModelError> {
        let qualifier_type = qualifier_type.into();
        if qualifier_type.is_empty() {
            return Err(ModelError::violation(
                Constraint::NonEmptyString,
                "qualifier type is empty",
            ));
        }
        Ok(Self {
            qualifier_type,
            value_type,
            value: value.map(|v| Value::parse(value_type, v)).transpose()?,
            kind: None,
            value_id: None,
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
        })
    }

    pub fn qualifier_type(&self) -> &str {
        &self.qualifier_type
    }

    pub fn value_type(&self) -> DataTypeDefXsd {
        self.value_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Replace the value; it must conform to the declared type.
    pub fn set_value(&mut self, value: Option<Value>) -> Result<(), ModelError> {
        if let Some(v) = value.as_ref().filter(|v| !v.conforms_to(self.value_type)) {
            return Err(ModelError::mismatch(self.value_type, v.render()));
        }
        self.value = value;
        Ok(())
    }
}

/// A named, optionally typed vendor annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    name: String,
    value_type: Option<DataTypeDefXsd>,
    value: Option<Value>,
    pub refers_to: Vec<Reference>,
    pub semantic_id: Option<Reference>,
    pub supplemental_semantic_ids: Vec<Reference>,
}

impl Extension {
    /// Create an extension. Without a declared type the value is a string.
    pub fn new(
        name: impl Into<String>,
        value_type: Option<DataTypeDefXsd>,
        value: Option<&str>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::violation(
                Constraint::NonEmptyString,
                "extension name is empty",
            ));
        }
        let parse_as = value_type.unwrap_or(DataTypeDefXsd::String);
        Ok(Self {
            name,
            value_type,
            value: value.map(|v| Value::parse(parse_as, v)).transpose()?,
            refers_to: Vec::new(),
            semantic_id: None,
            supplemental_semantic_ids: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> Option<DataTypeDefXsd> {
        self.value_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}
