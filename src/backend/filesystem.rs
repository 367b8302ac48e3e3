//! Directory-backed backend.
//!
//! Each object lives in two files named after the hex-encoded identifier:
//! `<hex>.obj` holds the bytes and `<hex>.rev` the revision token. Writes go
//! to a temporary file first and are renamed into place, object before
//! revision, so a reader never sees a torn object.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{BackendError, ConflictError, ObjectBackend, Revision, Stored};

const OBJECT_EXT: &str = "obj";
const REVISION_EXT: &str = "rev";

/// One directory, one pair of files per identifier.
#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    /// Serializes read-check-write sequences within this process.
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, id: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}.{ext}", hex::encode(id)))
    }

    fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, BackendError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn revision(&self, id: &str) -> Result<Option<Revision>, BackendError> {
        let Some(bytes) = Self::read_optional(&self.path(id, REVISION_EXT))? else {
            return Ok(None);
        };
        let token = String::from_utf8(bytes)
            .map_err(|e| BackendError::corrupt(id, format!("revision file: {e}")))?;
        Ok(Some(Revision::new(token.trim())))
    }

    fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ObjectBackend for FileBackend {
    fn get(&self, id: &str) -> Result<Option<Stored>, BackendError> {
        let Some(bytes) = Self::read_optional(&self.path(id, OBJECT_EXT))? else {
            return Ok(None);
        };
        let revision = self
            .revision(id)?
            .ok_or_else(|| BackendError::corrupt(id, "object has no revision file"))?;
        Ok(Some(Stored { bytes, revision }))
    }

    fn put(
        &self,
        id: &str,
        bytes: &[u8],
        expected: Option<&Revision>,
    ) -> Result<Revision, BackendError> {
        let _guard = self.write_lock.lock();
        let actual = self.revision(id)?;
        ConflictError::check(id, expected, actual.as_ref())?;
        let revision = Revision::fresh();
        Self::write_atomic(&self.path(id, OBJECT_EXT), bytes)?;
        Self::write_atomic(&self.path(id, REVISION_EXT), revision.as_str().as_bytes())?;
        debug!(id, revision = %revision, bytes = bytes.len(), root = %self.root.display(), "stored object");
        Ok(revision)
    }

    fn delete(&self, id: &str, expected: &Revision) -> Result<(), BackendError> {
        let _guard = self.write_lock.lock();
        let actual = self.revision(id)?;
        ConflictError::check(id, Some(expected), actual.as_ref())?;
        fs::remove_file(self.path(id, REVISION_EXT))?;
        match fs::remove_file(self.path(id, OBJECT_EXT)) {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        debug!(id, "deleted object");
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, BackendError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(OBJECT_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match hex::decode(stem).ok().and_then(|raw| String::from_utf8(raw).ok()) {
                Some(id) => ids.push(id),
                None => warn!(path = %path.display(), "ignoring file with undecodable name"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
