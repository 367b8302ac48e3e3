//! Typed access to a backend through one wire format.

use tracing::{debug, error};

use super::{BackendError, ObjectBackend, Revision, StoreError};
use crate::interchange::{EnvironmentFormat, Json};
use crate::model::{Environment, Identifiable, IdentifiableRef};

/// Stores identifiables in a backend, one encoded document per identifier.
pub struct IdentifiableStore<B> {
    backend: B,
    format: Box<dyn EnvironmentFormat>,
}

impl<B: ObjectBackend> IdentifiableStore<B> {
    pub fn new(backend: B, format: Box<dyn EnvironmentFormat>) -> Self {
        Self { backend, format }
    }

    /// Store documents as JSON.
    pub fn json(backend: B) -> Self {
        Self::new(backend, Box::new(Json::new()))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn format(&self) -> &dyn EnvironmentFormat {
        self.format.as_ref()
    }

    /// Fetch and decode one identifiable with its revision.
    pub fn get(&self, id: &str) -> Result<Option<(Identifiable, Revision)>, StoreError> {
        let Some(stored) = self.backend.get(id)? else {
            return Ok(None);
        };
        let identifiable = self.format.read_identifiable(&stored.bytes)?;
        if identifiable.id() != id {
            return Err(BackendError::corrupt(
                id,
                format!("document holds `{}`", identifiable.id()),
            )
            .into());
        }
        Ok(Some((identifiable, stored.revision)))
    }

    /// Store a new identifiable. Conflicts if the identifier is taken.
    pub fn create(&self, identifiable: IdentifiableRef<'_>) -> Result<Revision, StoreError> {
        self.write(identifiable, None)
    }

    /// Replace the stored identifiable at revision `expected`.
    pub fn update(
        &self,
        identifiable: IdentifiableRef<'_>,
        expected: &Revision,
    ) -> Result<Revision, StoreError> {
        self.write(identifiable, Some(expected))
    }

    fn write(
        &self,
        identifiable: IdentifiableRef<'_>,
        expected: Option<&Revision>,
    ) -> Result<Revision, StoreError> {
        let bytes = self.format.write_identifiable(identifiable)?;
        let id = identifiable.identifier().id();
        let revision = self.backend.put(id, &bytes, expected)?;
        debug!(id, format = self.format.name(), "wrote identifiable");
        Ok(revision)
    }

    pub fn delete(&self, id: &str, expected: &Revision) -> Result<(), StoreError> {
        Ok(self.backend.delete(id, expected)?)
    }

    pub fn ids(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.backend.list()?)
    }

    /// Decode everything into one environment, ready for resolution.
    ///
    /// Objects deleted between listing and fetching are skipped.
    pub fn load_environment(&self) -> Result<Environment, StoreError> {
        let mut env = Environment::new();
        for id in self.ids()? {
            match self.get(&id) {
                Ok(Some((identifiable, _))) => env.insert(identifiable)?,
                Ok(None) => {}
                Err(e) => {
                    error!(id = %id, error = %e, "failed to load identifiable");
                    return Err(e);
                }
            }
        }
        debug!(identifiables = env.len(), "loaded environment from backend");
        Ok(env)
    }
}
