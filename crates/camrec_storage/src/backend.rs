//! Recording store trait definition.

use crate::error::{StorageError, StorageResult};

/// A flat store of named, append-only files.
///
/// # Invariants
///
/// - `append` creates the file when absent, even for empty `data`
/// - bytes of successive `append` calls to one name are kept in call order
/// - `rename` replaces `to` if it already exists
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::DirectoryStore`] - For persistent storage
/// - [`super::InMemoryStore`] - For testing
pub trait RecordingStore: Send + Sync {
    /// Appends `data` to the named file, creating it if needed.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be
    /// opened or written.
    fn append(&self, name: &str, data: &[u8]) -> StorageResult<u64>;

    /// Renames `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if `from` does not exist, or an
    /// I/O error.
    fn rename(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Reads the full contents of the named file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    fn read(&self, name: &str) -> StorageResult<Vec<u8>>;

    /// Returns whether the named file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Lists all file names in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self) -> StorageResult<Vec<String>>;
}

/// Checks that `name` is a bare file name.
///
/// # Errors
///
/// Returns [`StorageError::InvalidName`] for empty names, `.`/`..`, or names
/// containing a path separator.
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(StorageError::invalid_name(name));
    }
    Ok(())
}
