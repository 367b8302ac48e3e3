//! The environment: a namespace of identifiables.

use indexmap::IndexMap;

use super::error::{Constraint, ModelError};
use super::identifiables::{
    AssetAdministrationShell, ConceptDescription, Identifiable, IdentifiableRef, Submodel,
};

/// Shells, submodels and concept descriptions keyed by identifier.
///
/// Identifiers are unique across all three kinds. Equality ignores the
/// order of identifiables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    shells: IndexMap<String, AssetAdministrationShell>,
    submodels: IndexMap<String, Submodel>,
    concept_descriptions: IndexMap<String, ConceptDescription>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identifiable. Fails if the identifier is already taken.
    pub fn insert(&mut self, identifiable: impl Into<Identifiable>) -> Result<(), ModelError> {
        let identifiable = identifiable.into();
        let id = identifiable.id().to_string();
        if self.contains(&id) {
            return Err(ModelError::violation(
                Constraint::IdentifierUnique,
                format!("identifier `{id}` is already in use"),
            ));
        }
        match identifiable {
            Identifiable::Shell(s) => {
                self.shells.insert(id, s);
            }
            Identifiable::Submodel(s) => {
                self.submodels.insert(id, s);
            }
            Identifiable::ConceptDescription(c) => {
                self.concept_descriptions.insert(id, c);
            }
        }
        Ok(())
    }

    /// Insert or overwrite an identifiable of any kind.
    pub fn replace(&mut self, identifiable: impl Into<Identifiable>) -> Option<Identifiable> {
        let identifiable = identifiable.into();
        let previous = self.remove(identifiable.id());
        // the slot is free now, so insert cannot fail
        let _ = self.insert(identifiable);
        previous
    }

    pub fn remove(&mut self, id: &str) -> Option<Identifiable> {
        if let Some(s) = self.shells.shift_remove(id) {
            return Some(s.into());
        }
        if let Some(s) = self.submodels.shift_remove(id) {
            return Some(s.into());
        }
        self.concept_descriptions.shift_remove(id).map(Into::into)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<IdentifiableRef<'_>> {
        self.shells
            .get(id)
            .map(IdentifiableRef::Shell)
            .or_else(|| self.submodels.get(id).map(IdentifiableRef::Submodel))
            .or_else(|| {
                self.concept_descriptions
                    .get(id)
                    .map(IdentifiableRef::ConceptDescription)
            })
    }

    pub fn shell(&self, id: &str) -> Option<&AssetAdministrationShell> {
        self.shells.get(id)
    }

    pub fn shell_mut(&mut self, id: &str) -> Option<&mut AssetAdministrationShell> {
        self.shells.get_mut(id)
    }

    pub fn submodel(&self, id: &str) -> Option<&Submodel> {
        self.submodels.get(id)
    }

    pub fn submodel_mut(&mut self, id: &str) -> Option<&mut Submodel> {
        self.submodels.get_mut(id)
    }

    pub fn concept_description(&self, id: &str) -> Option<&ConceptDescription> {
        self.concept_descriptions.get(id)
    }

    pub fn concept_description_mut(&mut self, id: &str) -> Option<&mut ConceptDescription> {
        self.concept_descriptions.get_mut(id)
    }

    pub fn shells(&self) -> impl Iterator<Item = &AssetAdministrationShell> {
        self.shells.values()
    }

    pub fn submodels(&self) -> impl Iterator<Item = &Submodel> {
        self.submodels.values()
    }

    pub fn concept_descriptions(&self) -> impl Iterator<Item = &ConceptDescription> {
        self.concept_descriptions.values()
    }

    /// All identifiables: shells, then submodels, then concept descriptions.
    pub fn iter(&self) -> impl Iterator<Item = IdentifiableRef<'_>> {
        self.shells
            .values()
            .map(IdentifiableRef::Shell)
            .chain(self.submodels.values().map(IdentifiableRef::Submodel))
            .chain(
                self.concept_descriptions
                    .values()
                    .map(IdentifiableRef::ConceptDescription),
            )
    }

    pub fn len(&self) -> usize {
        self.shells.len() + self.submodels.len() + self.concept_descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::referable::Identifier;

    #[test]
    fn test_identifiers_unique_across_kinds() {
        let mut env = Environment::new();
        env.insert(Submodel::new(Identifier::iri("urn:x").unwrap(), "sm").unwrap())
            .unwrap();
        let cd = ConceptDescription::new(Identifier::iri("urn:x").unwrap(), "cd").unwrap();
        let err = env.insert(cd).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::IdentifierUnique));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_remove_and_replace() {
        let mut env = Environment::new();
        let sm = Submodel::new(Identifier::iri("urn:x").unwrap(), "a").unwrap();
        env.insert(sm).unwrap();
        let replacement = Submodel::new(Identifier::iri("urn:x").unwrap(), "b").unwrap();
        assert!(env.replace(replacement).is_some());
        assert_eq!(env.submodel("urn:x").and_then(|s| s.common.id_short()), Some("b"));
        assert!(env.remove("urn:x").is_some());
        assert!(env.is_empty());
    }
}
