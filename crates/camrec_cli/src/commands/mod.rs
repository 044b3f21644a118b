//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod list;
pub mod recover;
pub mod verify;

use camrec_core::{CoreError, Direction, RecorderConfig, RecordingCatalog, RecordingEntry};
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Failure reading or renaming recordings.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Failure rendering JSON output.
    #[error("JSON output error: {0}")]
    Json(#[from] serde_json::Error),

    /// `verify` found malformed recordings.
    #[error("verification failed: {corrupt} of {checked} recordings are malformed")]
    VerificationFailed {
        /// Recordings that failed to decode.
        corrupt: usize,
        /// Recordings checked.
        checked: usize,
    },

    /// `recover` could not finalize some working files.
    #[error("{count} working files could not be recovered")]
    RecoveryIncomplete {
        /// Working files left in place.
        count: usize,
    },
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Output format shared by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Direction filter for `dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionFilter {
    /// Client to server.
    In,
    /// Server to client.
    Out,
}

impl DirectionFilter {
    /// Whether a packet in `direction` passes the filter.
    pub fn matches(self, direction: Direction) -> bool {
        matches!(
            (self, direction),
            (Self::In, Direction::Input) | (Self::Out, Direction::Output)
        )
    }
}

fn recordings_dir(path: Option<&Path>) -> PathBuf {
    path.map_or_else(|| RecorderConfig::default().directory, Path::to_path_buf)
}

/// Opens the recordings directory, defaulting to the recorder's default.
pub fn open_catalog(path: Option<&Path>) -> CliResult<RecordingCatalog> {
    Ok(RecordingCatalog::open(&recordings_dir(path))?)
}

/// Locates a recording given by bare file name or by path.
///
/// A bare name is looked up in the recordings directory; a path with a
/// directory component overrides it.
pub fn resolve_file(
    path: Option<&Path>,
    file: &str,
) -> CliResult<(RecordingCatalog, RecordingEntry)> {
    let file_path = Path::new(file);
    let (dir, name) = match (file_path.parent(), file_path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            (parent.to_path_buf(), name.to_string_lossy().into_owned())
        }
        _ => (recordings_dir(path), file.to_string()),
    };
    let catalog = RecordingCatalog::open(&dir)?;
    let entry = catalog.find(&name)?;
    Ok((catalog, entry))
}

/// Formats a byte count for text output.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Label used for a recording's kind in output.
pub fn kind_label(entry: &RecordingEntry) -> &'static str {
    if entry.is_working() {
        "working"
    } else {
        "permanent"
    }
}
