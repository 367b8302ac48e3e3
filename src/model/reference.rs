//! References: external identifiers and chains of typed keys into the model.

use super::error::{Constraint, ModelError};

/// Element type tag carried by a [`Key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyTypes {
    AnnotatedRelationshipElement,
    AssetAdministrationShell,
    BasicEventElement,
    Blob,
    Capability,
    ConceptDescription,
    DataElement,
    Entity,
    EventElement,
    File,
    FragmentReference,
    GlobalReference,
    Identifiable,
    MultiLanguageProperty,
    Operation,
    Property,
    Range,
    Referable,
    ReferenceElement,
    RelationshipElement,
    Submodel,
    SubmodelElement,
    SubmodelElementCollection,
    SubmodelElementList,
}

impl KeyTypes {
    pub const ALL: [Self; 24] = [
        Self::AnnotatedRelationshipElement,
        Self::AssetAdministrationShell,
        Self::BasicEventElement,
        Self::Blob,
        Self::Capability,
        Self::ConceptDescription,
        Self::DataElement,
        Self::Entity,
        Self::EventElement,
        Self::File,
        Self::FragmentReference,
        Self::GlobalReference,
        Self::Identifiable,
        Self::MultiLanguageProperty,
        Self::Operation,
        Self::Property,
        Self::Range,
        Self::Referable,
        Self::ReferenceElement,
        Self::RelationshipElement,
        Self::Submodel,
        Self::SubmodelElement,
        Self::SubmodelElementCollection,
        Self::SubmodelElementList,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AnnotatedRelationshipElement => "AnnotatedRelationshipElement",
            Self::AssetAdministrationShell => "AssetAdministrationShell",
            Self::BasicEventElement => "BasicEventElement",
            Self::Blob => "Blob",
            Self::Capability => "Capability",
            Self::ConceptDescription => "ConceptDescription",
            Self::DataElement => "DataElement",
            Self::Entity => "Entity",
            Self::EventElement => "EventElement",
            Self::File => "File",
            Self::FragmentReference => "FragmentReference",
            Self::GlobalReference => "GlobalReference",
            Self::Identifiable => "Identifiable",
            Self::MultiLanguageProperty => "MultiLanguageProperty",
            Self::Operation => "Operation",
            Self::Property => "Property",
            Self::Range => "Range",
            Self::Referable => "Referable",
            Self::ReferenceElement => "ReferenceElement",
            Self::RelationshipElement => "RelationshipElement",
            Self::Submodel => "Submodel",
            Self::SubmodelElement => "SubmodelElement",
            Self::SubmodelElementCollection => "SubmodelElementCollection",
            Self::SubmodelElementList => "SubmodelElementList",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }

    /// Keys that may start a model reference.
    pub fn is_identifiable(&self) -> bool {
        matches!(
            self,
            Self::AssetAdministrationShell
                | Self::Submodel
                | Self::ConceptDescription
                | Self::Identifiable
        )
    }

    /// Keys that may be followed by child keys.
    ///
    /// Abstract tags count as containers because the concrete node they
    /// address may be one.
    fn admits_children(&self) -> bool {
        matches!(
            self,
            Self::Submodel
                | Self::SubmodelElementCollection
                | Self::SubmodelElementList
                | Self::Entity
                | Self::AnnotatedRelationshipElement
                | Self::Operation
                | Self::RelationshipElement
                | Self::SubmodelElement
                | Self::Referable
                | Self::Identifiable
        )
    }
}

impl std::fmt::Display for KeyTypes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a reference: a type tag plus an identifier or id-short.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    key_type: KeyTypes,
    value: String,
}

impl Key {
    pub fn new(key_type: KeyTypes, value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ModelError::violation(
                Constraint::NonEmptyString,
                format!("{key_type} key has an empty value"),
            ));
        }
        Ok(Self { key_type, value })
    }

    pub fn key_type(&self) -> KeyTypes {
        self.key_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})[{}]", self.key_type, self.value)
    }
}

/// Reference to something outside the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExternalReference {
    value: String,
    referred_semantic_id: Option<Box<Reference>>,
}

impl ExternalReference {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ModelError::violation(
                Constraint::ExternalReferenceKey,
                "external reference has an empty value",
            ));
        }
        Ok(Self {
            value,
            referred_semantic_id: None,
        })
    }

    /// Rebuild an external reference from its wire keys.
    pub fn from_keys(keys: Vec<Key>) -> Result<Self, ModelError> {
        match keys.as_slice() {
            [key] if key.key_type == KeyTypes::GlobalReference => Ok(Self {
                value: key.value.clone(),
                referred_semantic_id: None,
            }),
            _ => Err(ModelError::violation(
                Constraint::ExternalReferenceKey,
                format!(
                    "external reference must carry exactly one GlobalReference key, found {}",
                    describe_chain(&keys)
                ),
            )),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// The single wire key.
    pub fn key(&self) -> Key {
        Key {
            key_type: KeyTypes::GlobalReference,
            value: self.value.clone(),
        }
    }
}

/// Reference resolved by walking a chain of keys inside the graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelReference {
    keys: Vec<Key>,
    referred_semantic_id: Option<Box<Reference>>,
}

impl ModelReference {
    pub fn new(keys: Vec<Key>) -> Result<Self, ModelError> {
        check_key_chain(&keys)?;
        Ok(Self {
            keys,
            referred_semantic_id: None,
        })
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Extend the chain by one child key. The child has its own semantics,
    /// so the referred semantic id is not carried over.
    pub fn child(&self, key: Key) -> Result<Self, ModelError> {
        let mut keys = self.keys.clone();
        keys.push(key);
        Self::new(keys)
    }
}

/// Either kind of reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reference {
    External(ExternalReference),
    Model(ModelReference),
}

impl Reference {
    /// Shorthand for an external reference to a global identifier.
    pub fn external(value: impl Into<String>) -> Result<Self, ModelError> {
        ExternalReference::new(value).map(Self::External)
    }

    /// Shorthand for a model reference.
    pub fn model(keys: Vec<Key>) -> Result<Self, ModelError> {
        ModelReference::new(keys).map(Self::Model)
    }

    /// Model reference to a single identifiable.
    pub fn to_identifiable(key_type: KeyTypes, id: impl Into<String>) -> Result<Self, ModelError> {
        Self::model(vec![Key::new(key_type, id)?])
    }

    /// The wire name of the reference kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::External(_) => "ExternalReference",
            Self::Model(_) => "ModelReference",
        }
    }

    /// The wire keys.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Self::External(r) => vec![r.key()],
            Self::Model(r) => r.keys.clone(),
        }
    }

    /// Build a reference from its wire kind and keys.
    pub fn from_parts(type_name: &str, keys: Vec<Key>) -> Option<Result<Self, ModelError>> {
        match type_name {
            "ExternalReference" => Some(ExternalReference::from_keys(keys).map(Self::External)),
            "ModelReference" => Some(ModelReference::new(keys).map(Self::Model)),
            _ => None,
        }
    }

    /// Semantic id of the referenced element, as seen by the referrer.
    pub fn referred_semantic_id(&self) -> Option<&Reference> {
        match self {
            Self::External(r) => r.referred_semantic_id.as_deref(),
            Self::Model(r) => r.referred_semantic_id.as_deref(),
        }
    }

    pub fn set_referred_semantic_id(&mut self, referred: Option<Reference>) {
        let referred = referred.map(Box::new);
        match self {
            Self::External(r) => r.referred_semantic_id = referred,
            Self::Model(r) => r.referred_semantic_id = referred,
        }
    }

    pub fn with_referred_semantic_id(mut self, referred: Reference) -> Self {
        self.set_referred_semantic_id(Some(referred));
        self
    }

    pub fn as_model(&self) -> Option<&ModelReference> {
        match self {
            Self::Model(r) => Some(r),
            Self::External(_) => None,
        }
    }
}

fn describe_chain(keys: &[Key]) -> String {
    if keys.is_empty() {
        return "no keys".to_string();
    }
    keys.iter().map(Key::to_string).collect::<Vec<_>>().join("")
}

/// Check that a key chain is consistent with the node types it traverses.
pub fn check_key_chain(keys: &[Key]) -> Result<(), ModelError> {
    let broken = |detail: String| ModelError::violation(Constraint::ReferenceKeyChain, detail);

    let Some(first) = keys.first() else {
        return Err(broken("model reference has no keys".to_string()));
    };
    if !first.key_type.is_identifiable() {
        return Err(broken(format!(
            "first key {first} does not address an identifiable"
        )));
    }
    if matches!(
        first.key_type,
        KeyTypes::AssetAdministrationShell | KeyTypes::ConceptDescription
    ) && keys.len() > 1
    {
        return Err(broken(format!("{first} has no addressable children")));
    }

    for (index, pair) in keys.windows(2).enumerate() {
        let (parent, key) = (&pair[0], &pair[1]);
        let index = index + 1;
        if key.key_type.is_identifiable() || key.key_type == KeyTypes::GlobalReference {
            return Err(broken(format!("key {index} {key} cannot follow another key")));
        }
        if key.key_type == KeyTypes::FragmentReference {
            if !matches!(parent.key_type, KeyTypes::File | KeyTypes::Blob) || index + 1 != keys.len()
            {
                return Err(broken(format!(
                    "fragment key {index} must be the last key and follow a File or Blob"
                )));
            }
            continue;
        }
        if !parent.key_type.admits_children() {
            return Err(broken(format!("{parent} must be the last key in the chain")));
        }
        if parent.key_type == KeyTypes::SubmodelElementList
            && !key.value.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(broken(format!(
                "key {index} below a list must be a decimal index, found `{}`",
                key.value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(t: KeyTypes, v: &str) -> Key {
        Key::new(t, v).unwrap()
    }

    #[test]
    fn test_valid_chain() {
        let r = ModelReference::new(vec![
            key(KeyTypes::Submodel, "urn:sm"),
            key(KeyTypes::SubmodelElementList, "items"),
            key(KeyTypes::SubmodelElementCollection, "0"),
            key(KeyTypes::File, "manual"),
            key(KeyTypes::FragmentReference, "page=3"),
        ]);
        assert!(r.is_ok());
    }

    #[test]
    fn test_property_must_be_last() {
        let err = ModelReference::new(vec![
            key(KeyTypes::Submodel, "urn:sm"),
            key(KeyTypes::Property, "p"),
            key(KeyTypes::Property, "q"),
        ])
        .unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::ReferenceKeyChain));
    }

    #[test]
    fn test_chain_must_start_at_identifiable() {
        assert!(ModelReference::new(vec![]).is_err());
        assert!(ModelReference::new(vec![key(KeyTypes::Property, "p")]).is_err());
        assert!(
            ModelReference::new(vec![
                key(KeyTypes::AssetAdministrationShell, "urn:aas"),
                key(KeyTypes::Property, "p"),
            ])
            .is_err()
        );
    }

    #[test]
    fn test_operation_variable_chain() {
        let r = ModelReference::new(vec![
            key(KeyTypes::Submodel, "urn:sm"),
            key(KeyTypes::Operation, "start"),
            key(KeyTypes::Property, "speed"),
        ]);
        assert!(r.is_ok());
    }

    #[test]
    fn test_list_child_needs_index() {
        let err = ModelReference::new(vec![
            key(KeyTypes::Submodel, "urn:sm"),
            key(KeyTypes::SubmodelElementList, "items"),
            key(KeyTypes::Property, "first"),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_external_reference_keys() {
        let ext = ExternalReference::from_keys(vec![key(KeyTypes::GlobalReference, "urn:x")]);
        assert_eq!(ext.unwrap().value(), "urn:x");
        let err = ExternalReference::from_keys(vec![key(KeyTypes::Submodel, "urn:x")]).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::ExternalReferenceKey));
    }

    #[test]
    fn test_referred_semantic_id_is_part_of_equality() {
        let plain = Reference::external("urn:unit").unwrap();
        let referred = Reference::external("urn:unit:semantics").unwrap();
        let annotated = plain.clone().with_referred_semantic_id(referred.clone());
        assert_eq!(annotated.referred_semantic_id(), Some(&referred));
        assert_ne!(annotated, plain);

        let mut cleared = annotated;
        cleared.set_referred_semantic_id(None);
        assert_eq!(cleared, plain);
    }

    #[test]
    fn test_empty_key_value_rejected() {
        assert!(Key::new(KeyTypes::Property, "").is_err());
    }
}
