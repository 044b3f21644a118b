//! In-memory recording store for testing.

use crate::backend::{validate_name, RecordingStore};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory recording store.
///
/// Suitable for unit and integration tests that exercise the recorder
/// without touching the filesystem.
///
/// # Example
///
/// ```rust
/// use camrec_storage::{InMemoryStore, RecordingStore};
///
/// let store = InMemoryStore::new();
/// assert_eq!(store.append("x.cam.tmp", b"abc").unwrap(), 0);
/// assert_eq!(store.append("x.cam.tmp", b"def").unwrap(), 3);
/// assert_eq!(store.read("x.cam.tmp").unwrap(), b"abcdef");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents of a file as UTF-8 text, if present.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        self.files
            .read()
            .get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
    }

    /// Returns the number of stored files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }
}

impl RecordingStore for InMemoryStore {
    fn append(&self, name: &str, data: &[u8]) -> StorageResult<u64> {
        validate_name(name)?;
        let mut files = self.files.write();
        let file = files.entry(name.to_string()).or_default();
        let offset = file.len() as u64;
        file.extend_from_slice(data);
        Ok(offset)
    }

    fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        validate_name(from)?;
        validate_name(to)?;
        let mut files = self.files.write();
        let data = files.remove(from).ok_or_else(|| StorageError::not_found(from))?;
        files.insert(to.to_string(), data);
        Ok(())
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        validate_name(name)?;
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::not_found(name))
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        validate_name(name)?;
        Ok(self.files.read().contains_key(name))
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self.files.read().keys().cloned().collect())
    }
}
