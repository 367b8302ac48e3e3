//! In-process backend.

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use super::{BackendError, ConflictError, ObjectBackend, Revision, Stored};

/// Objects kept in an insertion-ordered map behind a lock.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<IndexMap<String, Stored>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

impl ObjectBackend for MemoryBackend {
    fn get(&self, id: &str) -> Result<Option<Stored>, BackendError> {
        Ok(self.objects.read().get(id).cloned())
    }

    fn put(
        &self,
        id: &str,
        bytes: &[u8],
        expected: Option<&Revision>,
    ) -> Result<Revision, BackendError> {
        let mut objects = self.objects.write();
        let actual = objects.get(id).map(|s| &s.revision);
        ConflictError::check(id, expected, actual)?;
        let revision = Revision::fresh();
        objects.insert(
            id.to_string(),
            Stored {
                bytes: bytes.to_vec(),
                revision: revision.clone(),
            },
        );
        debug!(id, revision = %revision, bytes = bytes.len(), "stored object");
        Ok(revision)
    }

    fn delete(&self, id: &str, expected: &Revision) -> Result<(), BackendError> {
        let mut objects = self.objects.write();
        let actual = objects.get(id).map(|s| &s.revision);
        ConflictError::check(id, Some(expected), actual)?;
        objects.shift_remove(id);
        debug!(id, "deleted object");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.objects.read().keys().cloned().collect())
    }
}
