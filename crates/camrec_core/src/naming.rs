//! Recording file naming.
//!
//! Each session owns two names inside the recordings directory:
//!
//! ```text
//! <owner_id>.<start_time>.cam.tmp   # working file, appended every flush
//! <owner_id>.<start_time>.cam       # permanent file, renamed on close
//! ```
//!
//! `start_time` is the session start in epoch milliseconds.

use crate::types::Timestamp;
use std::fmt;

const PERMANENT_SUFFIX: &str = ".cam";
const WORKING_SUFFIX: &str = ".cam.tmp";

/// Which of the two files of a recording a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Still being appended to, or orphaned after a failed close.
    Working,
    /// Finalized.
    Permanent,
}

/// The identity part of a recording file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingName {
    /// Owner id of the session.
    pub owner_id: u32,
    /// Session start time.
    pub start_time: Timestamp,
}

impl RecordingName {
    /// Creates a recording name.
    #[must_use]
    pub const fn new(owner_id: u32, start_time: Timestamp) -> Self {
        Self {
            owner_id,
            start_time,
        }
    }

    /// Returns the working file name.
    #[must_use]
    pub fn working_file_name(&self) -> String {
        format!("{self}{WORKING_SUFFIX}")
    }

    /// Returns the permanent file name.
    #[must_use]
    pub fn permanent_file_name(&self) -> String {
        format!("{self}{PERMANENT_SUFFIX}")
    }

    /// Returns the file name of the given kind.
    #[must_use]
    pub fn file_name(&self, kind: FileKind) -> String {
        match kind {
            FileKind::Working => self.working_file_name(),
            FileKind::Permanent => self.permanent_file_name(),
        }
    }

    /// Parses a file name produced by this scheme.
    ///
    /// Returns `None` for anything else, so unrelated files in the
    /// recordings directory are ignored.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<(Self, FileKind)> {
        let (stem, kind) = if let Some(stem) = file_name.strip_suffix(WORKING_SUFFIX) {
            (stem, FileKind::Working)
        } else if let Some(stem) = file_name.strip_suffix(PERMANENT_SUFFIX) {
            (stem, FileKind::Permanent)
        } else {
            return None;
        };

        let (owner, start) = stem.split_once('.')?;
        let owner_id = owner.parse::<u32>().ok()?;
        let start_time = start.parse::<i64>().ok()?;
        Some((Self::new(owner_id, Timestamp::from_millis(start_time)), kind))
    }
}

impl fmt::Display for RecordingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner_id, self.start_time)
    }
}
