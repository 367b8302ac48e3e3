//! Storage collaborators.
//!
//! The core never persists anything itself. It hands already-encoded bytes
//! to an [`ObjectBackend`] keyed by identifier, with optimistic concurrency
//! through opaque [`Revision`] tokens. [`IdentifiableStore`] joins a backend
//! with an [`EnvironmentFormat`](crate::interchange::EnvironmentFormat) so
//! callers deal in [`Identifiable`](crate::model::Identifiable)s.

mod filesystem;
mod memory;
mod store;

use std::sync::Arc;

use thiserror::Error;

use crate::interchange::InterchangeError;
use crate::model::ModelError;

pub use filesystem::FileBackend;
pub use memory::MemoryBackend;
pub use store::IdentifiableStore;

/// Opaque version token handed out by a backend on every write.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Revision(Arc<str>);

impl Revision {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// A token no other write has produced.
    pub(crate) fn fresh() -> Self {
        Self::new(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object as held by a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stored {
    pub bytes: Vec<u8>,
    pub revision: Revision,
}

fn show(revision: &Option<Revision>) -> &str {
    revision.as_ref().map_or("<absent>", Revision::as_str)
}

/// Optimistic-concurrency failure: the caller's view of an object is stale.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("revision conflict on `{id}`: expected {}, found {}", show(.expected), show(.actual))]
pub struct ConflictError {
    pub id: String,
    /// What the caller expected; `None` means "must not exist yet".
    pub expected: Option<Revision>,
    /// What the backend holds; `None` means "does not exist".
    pub actual: Option<Revision>,
}

impl ConflictError {
    /// Check the held revision against the caller's expectation.
    pub(crate) fn check(
        id: &str,
        expected: Option<&Revision>,
        actual: Option<&Revision>,
    ) -> Result<(), Self> {
        if expected == actual {
            return Ok(());
        }
        Err(Self {
            id: id.to_string(),
            expected: expected.cloned(),
            actual: actual.cloned(),
        })
    }
}

/// Errors raised by a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data the backend cannot make sense of.
    #[error("corrupt object `{id}`: {reason}")]
    Corrupt { id: String, reason: String },
}

impl BackendError {
    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn as_conflict(&self) -> Option<&ConflictError> {
        match self {
            Self::Conflict(c) => Some(c),
            _ => None,
        }
    }
}

/// The key/value contract every storage adapter satisfies.
///
/// Keys are identifiers. Every successful write returns a new revision;
/// writes and deletes name the revision they expect to replace, so two
/// writers racing on one object cannot both succeed.
pub trait ObjectBackend: Send + Sync {
    /// Fetch an object and its current revision.
    fn get(&self, id: &str) -> Result<Option<Stored>, BackendError>;

    /// Store `bytes` under `id`.
    ///
    /// With `expected = None` the object must not exist yet. Otherwise the
    /// held revision must equal `expected`.
    fn put(
        &self,
        id: &str,
        bytes: &[u8],
        expected: Option<&Revision>,
    ) -> Result<Revision, BackendError>;

    /// Remove an object whose held revision equals `expected`.
    fn delete(&self, id: &str, expected: &Revision) -> Result<(), BackendError>;

    /// All stored identifiers.
    fn list(&self) -> Result<Vec<String>, BackendError>;
}

impl<B: ObjectBackend + ?Sized> ObjectBackend for Box<B> {
    fn get(&self, id: &str) -> Result<Option<Stored>, BackendError> {
        (**self).get(id)
    }

    fn put(
        &self,
        id: &str,
        bytes: &[u8],
        expected: Option<&Revision>,
    ) -> Result<Revision, BackendError> {
        (**self).put(id, bytes, expected)
    }

    fn delete(&self, id: &str, expected: &Revision) -> Result<(), BackendError> {
        (**self).delete(id, expected)
    }

    fn list(&self) -> Result<Vec<String>, BackendError> {
        (**self).list()
    }
}

/// Errors from [`IdentifiableStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Interchange(#[from] InterchangeError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    /// The conflict, if this is one. Callers re-fetch and retry on it.
    pub fn as_conflict(&self) -> Option<&ConflictError> {
        match self {
            Self::Backend(b) => b.as_conflict(),
            _ => None,
        }
    }
}
