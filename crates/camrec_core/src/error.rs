//! Error types for camrec core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in camrec core operations.
///
/// None of these reach the host server through the capture API: the
/// recorder logs them and carries on. They surface through the lower-level
/// components and the recording catalog.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] camrec_storage::StorageError),

    /// Recording decode error.
    #[error("codec error: {0}")]
    Codec(#[from] camrec_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file name does not follow the recording naming scheme.
    #[error("not a recording file name: {name}")]
    InvalidRecordingName {
        /// The rejected file name.
        name: String,
    },

    /// A permanent recording already exists under the target name.
    #[error("recording already finalized: {name}")]
    AlreadyFinalized {
        /// The existing permanent file name.
        name: String,
    },
}

impl CoreError {
    /// Creates an invalid recording name error.
    pub fn invalid_recording_name(name: impl Into<String>) -> Self {
        Self::InvalidRecordingName { name: name.into() }
    }

    /// Creates an already finalized error.
    pub fn already_finalized(name: impl Into<String>) -> Self {
        Self::AlreadyFinalized { name: name.into() }
    }
    /// Returns true if a file was missing, e.g. renamed away concurrently.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::Storage(camrec_storage::StorageError::NotFound { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camrec_storage::StorageError;

    #[test]
    fn only_storage_not_found_counts_as_missing() {
        assert!(CoreError::from(StorageError::not_found("1.1.cam")).is_not_found());
        assert!(!CoreError::from(io::Error::from(io::ErrorKind::NotFound)).is_not_found());
        assert!(!CoreError::already_finalized("1.1.cam").is_not_found());
    }
}
