//! Directory-backed recording store.

use crate::backend::{validate_name, RecordingStore};
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// A recording store backed by files in one OS directory.
///
/// # Durability
///
/// Every `append` opens the file in append mode, writes, flushes and closes
/// it. With `sync_on_write` enabled the file is also `sync_all`ed, and the
/// directory is fsynced after each rename so the new name survives a crash.
///
/// # Example
///
/// ```no_run
/// use camrec_storage::{DirectoryStore, RecordingStore};
/// use std::path::Path;
///
/// let store = DirectoryStore::open(Path::new("data/cams")).unwrap();
/// store.append("3.1700000000000.cam.tmp", b"< 12 0102\n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    sync_on_write: bool,
}

impl DirectoryStore {
    /// Opens a store rooted at an existing directory.
    ///
    /// The directory is never created: a missing recordings directory is
    /// treated as a configuration fault by callers.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotADirectory`] if `root` does not exist or is
    /// not a directory.
    pub fn open(root: &Path) -> StorageResult<Self> {
        if !root.is_dir() {
            return Err(StorageError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
            sync_on_write: false,
        })
    }

    /// Sets whether writes and renames are synced to disk.
    #[must_use]
    pub fn with_sync(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the full path of a named file.
    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> io::Result<()> {
        File::open(&self.root)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> io::Result<()> {
        // NTFS journals metadata; directory handles cannot be fsynced
        Ok(())
    }
}

fn map_not_found(err: io::Error, name: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::not_found(name)
    } else {
        StorageError::Io(err)
    }
}

impl RecordingStore for DirectoryStore {
    fn append(&self, name: &str, data: &[u8]) -> StorageResult<u64> {
        validate_name(name)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_of(name))?;

        let offset = file.metadata()?.len();
        file.write_all(data)?;
        file.flush()?;

        if self.sync_on_write {
            file.sync_all()?;
        }

        Ok(offset)
    }

    fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        validate_name(from)?;
        validate_name(to)?;

        fs::rename(self.path_of(from), self.path_of(to)).map_err(|e| map_not_found(e, from))?;

        if self.sync_on_write {
            self.sync_directory()?;
        }

        Ok(())
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        validate_name(name)?;
        fs::read(self.path_of(name)).map_err(|e| map_not_found(e, name))
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        validate_name(name)?;
        Ok(self.path_of(name).is_file())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_requires_existing_directory() {
        let temp = tempdir().unwrap();
        let missing = temp.path().join("missing");

        let result = DirectoryStore::open(&missing);
        assert!(matches!(result, Err(StorageError::NotADirectory { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn open_rejects_regular_file() {
        let temp = tempdir().unwrap();
        let file_path = temp.path().join("plain.txt");
        fs::write(&file_path, b"x").unwrap();

        let result = DirectoryStore::open(&file_path);
        assert!(matches!(result, Err(StorageError::NotADirectory { .. })));
    }

    #[test]
    fn append_creates_and_extends() {
        let temp = tempdir().unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap();

        assert_eq!(store.append("a.cam.tmp", b"first\n").unwrap(), 0);
        assert_eq!(store.append("a.cam.tmp", b"second\n").unwrap(), 6);

        let data = fs::read(temp.path().join("a.cam.tmp")).unwrap();
        assert_eq!(data, b"first\nsecond\n");
    }

    #[test]
    fn empty_append_still_creates_file() {
        let temp = tempdir().unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap();

        store.append("empty.cam.tmp", b"").unwrap();
        assert!(store.exists("empty.cam.tmp").unwrap());
        assert!(store.read("empty.cam.tmp").unwrap().is_empty());
    }

    #[test]
    fn rename_moves_content() {
        let temp = tempdir().unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap().with_sync(true);

        store.append("s.cam.tmp", b"> 0 ff\n").unwrap();
        store.rename("s.cam.tmp", "s.cam").unwrap();

        assert!(!store.exists("s.cam.tmp").unwrap());
        assert_eq!(store.read("s.cam").unwrap(), b"> 0 ff\n");
    }

    #[test]
    fn rename_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap();

        let result = store.rename("nope.cam.tmp", "nope.cam");
        assert!(matches!(result, Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn list_skips_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap();

        store.append("b.cam", b"").unwrap();
        store.append("a.cam", b"").unwrap();

        assert_eq!(store.list().unwrap(), vec!["a.cam", "b.cam"]);
    }

    #[test]
    fn names_with_separators_are_rejected() {
        let temp = tempdir().unwrap();
        let store = DirectoryStore::open(temp.path()).unwrap();

        let result = store.append("../escape.cam", b"x");
        assert!(matches!(result, Err(StorageError::InvalidName { .. })));
    }
}
