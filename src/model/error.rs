//! Errors raised while constructing or mutating metamodel entities.

use thiserror::Error;

use super::value::DataTypeDefXsd;

/// The named invariants of the metamodel.
///
/// Every [`ModelError::ConstraintViolation`] and every validation
/// [`Violation`](crate::validation::Violation) names exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Constraint {
    /// Identifier strings are non-empty.
    IdentifierNonEmpty,
    /// Identifiers are unique within a namespace.
    IdentifierUnique,
    /// id-short follows the identifier-like lexical grammar.
    IdShortSyntax,
    /// id-short is present wherever the element is not a list item.
    IdShortRequired,
    /// id-short is unique among siblings.
    IdShortUnique,
    /// Language tags are well formed.
    LanguageTag,
    /// A mandatory string attribute is non-empty.
    NonEmptyString,
    /// Model reference key chains are well formed.
    ReferenceKeyChain,
    /// External references carry exactly one global key.
    ExternalReferenceKey,
    /// Typed values agree with their declared value type.
    ValueTypeAgreement,
    /// List items match the declared element type.
    ListElementType,
    /// List items match the declared value type.
    ListValueType,
    /// Annotations of an annotated relationship are data elements.
    AnnotationDataElement,
    /// Qualifier types are unique per qualifiable.
    QualifierTypeUnique,
    /// Extension names are unique per referable.
    ExtensionNameUnique,
    /// A child reports its container as parent.
    ParentConsistency,
    /// Entity asset ids agree with the entity type.
    EntityAssetId,
    /// Asset information carries at least one asset id.
    AssetInformationAssetId,
    /// A revision requires a version.
    AdministrationVersion,
    /// IEC 61360 content has a preferred name.
    Iec61360PreferredName,
    /// IEC 61360 value lists are non-empty.
    Iec61360ValueList,
    /// Shell submodel references point at submodels.
    SubmodelReference,
    /// Event elements observe something inside the model.
    EventObservedReference,
}

impl Constraint {
    /// Stable kebab-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::IdentifierNonEmpty => "identifier-non-empty",
            Self::IdentifierUnique => "identifier-unique",
            Self::IdShortSyntax => "id-short-syntax",
            Self::IdShortRequired => "id-short-required",
            Self::IdShortUnique => "id-short-unique",
            Self::LanguageTag => "language-tag",
            Self::NonEmptyString => "non-empty-string",
            Self::ReferenceKeyChain => "reference-key-chain",
            Self::ExternalReferenceKey => "external-reference-key",
            Self::ValueTypeAgreement => "value-type-agreement",
            Self::ListElementType => "list-element-type",
            Self::ListValueType => "list-value-type",
            Self::AnnotationDataElement => "annotation-data-element",
            Self::QualifierTypeUnique => "qualifier-type-unique",
            Self::ExtensionNameUnique => "extension-name-unique",
            Self::ParentConsistency => "parent-consistency",
            Self::EntityAssetId => "entity-asset-id",
            Self::AssetInformationAssetId => "asset-information-asset-id",
            Self::AdministrationVersion => "administration-version",
            Self::Iec61360PreferredName => "iec61360-preferred-name",
            Self::Iec61360ValueList => "iec61360-value-list",
            Self::SubmodelReference => "submodel-reference",
            Self::EventObservedReference => "event-observed-reference",
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised by metamodel constructors and container operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A value does not parse under its declared value type.
    #[error("value `{value}` does not conform to {value_type}")]
    ValueTypeMismatch {
        value_type: DataTypeDefXsd,
        value: String,
    },

    /// A metamodel invariant is broken.
    #[error("constraint {constraint} violated: {detail}")]
    ConstraintViolation {
        constraint: Constraint,
        detail: String,
    },

    /// A list position is past the end of the list.
    #[error("index {index} is out of bounds for a list of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl ModelError {
    /// Create a value type mismatch error.
    pub fn mismatch(value_type: DataTypeDefXsd, value: impl Into<String>) -> Self {
        Self::ValueTypeMismatch {
            value_type,
            value: value.into(),
        }
    }

    /// Create a constraint violation error.
    pub fn violation(constraint: Constraint, detail: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            constraint,
            detail: detail.into(),
        }
    }

    /// The violated constraint, if this is a constraint violation.
    pub fn constraint(&self) -> Option<Constraint> {
        match self {
            Self::ConstraintViolation { constraint, .. } => Some(*constraint),
            Self::ValueTypeMismatch { .. } | Self::IndexOutOfBounds { .. } => None,
        }
    }
}
