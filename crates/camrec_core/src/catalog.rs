//! Read access to finished and orphaned recordings.

use crate::error::{CoreError, CoreResult};
use crate::naming::{FileKind, RecordingName};
use camrec_codec::{from_cam, CamLine, Direction};
use camrec_storage::{DirectoryStore, RecordingStore};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A recording file found in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingEntry {
    /// Owner and start time parsed from the file name.
    pub name: RecordingName,
    /// Working or permanent.
    pub kind: FileKind,
    /// The file name itself.
    pub file_name: String,
}

impl RecordingEntry {
    /// Whether this is a working file.
    pub fn is_working(&self) -> bool {
        self.kind == FileKind::Working
    }
}

/// Aggregate figures for one recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordingSummary {
    /// Size of the file in bytes.
    pub size_bytes: u64,
    /// Number of packet lines.
    pub packets: usize,
    /// Input packet count.
    pub input_packets: usize,
    /// Output packet count.
    pub output_packets: usize,
    /// Input payload bytes.
    pub input_bytes: u64,
    /// Output payload bytes.
    pub output_bytes: u64,
    /// Offset of the first packet.
    pub first_offset: Option<i64>,
    /// Offset of the last packet.
    pub last_offset: Option<i64>,
}

impl RecordingSummary {
    /// Summarizes decoded lines.
    pub fn from_lines(lines: &[CamLine], size_bytes: u64) -> Self {
        let mut summary = Self {
            size_bytes,
            packets: lines.len(),
            first_offset: lines.first().map(|l| l.offset),
            last_offset: lines.last().map(|l| l.offset),
            ..Self::default()
        };
        for line in lines {
            let len = line.payload.len() as u64;
            match line.direction {
                Direction::Input => {
                    summary.input_packets += 1;
                    summary.input_bytes += len;
                }
                Direction::Output => {
                    summary.output_packets += 1;
                    summary.output_bytes += len;
                }
            }
        }
        summary
    }

    /// Decodes a raw recording and summarizes it.
    ///
    /// # Errors
    ///
    /// Returns the codec error for the first malformed line.
    pub fn decode(bytes: &[u8]) -> CoreResult<Self> {
        let lines = from_cam(bytes)?;
        Ok(Self::from_lines(&lines, bytes.len() as u64))
    }

    /// Milliseconds between session start and the last packet.
    pub fn duration_ms(&self) -> i64 {
        self.last_offset.unwrap_or(0)
    }
}

/// Lists, decodes and recovers recordings in a store.
///
/// Files whose names are not recording names are ignored.
#[derive(Clone)]
pub struct RecordingCatalog {
    store: Arc<dyn RecordingStore>,
}

impl RecordingCatalog {
    /// Creates a catalog over a store.
    pub fn new(store: Arc<dyn RecordingStore>) -> Self {
        Self { store }
    }

    /// Opens a catalog over a recordings directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not an existing directory.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Ok(Self::new(Arc::new(DirectoryStore::open(path)?)))
    }

    /// Returns every recording, ordered by file name.
    pub fn entries(&self) -> CoreResult<Vec<RecordingEntry>> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter_map(|file_name| {
                RecordingName::parse(&file_name).map(|(name, kind)| RecordingEntry {
                    name,
                    kind,
                    file_name,
                })
            })
            .collect())
    }

    /// Returns working files only.
    pub fn orphans(&self) -> CoreResult<Vec<RecordingEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(RecordingEntry::is_working)
            .collect())
    }

    /// Looks up a recording by file name.
    pub fn find(&self, file_name: &str) -> CoreResult<RecordingEntry> {
        let (name, kind) = RecordingName::parse(file_name)
            .ok_or_else(|| CoreError::invalid_recording_name(file_name))?;
        if !self.store.exists(file_name)? {
            return Err(camrec_storage::StorageError::not_found(file_name).into());
        }
        Ok(RecordingEntry {
            name,
            kind,
            file_name: file_name.to_string(),
        })
    }

    /// Returns the raw bytes of a recording.
    pub fn raw(&self, entry: &RecordingEntry) -> CoreResult<Vec<u8>> {
        Ok(self.store.read(&entry.file_name)?)
    }

    /// Decodes a recording.
    pub fn load(&self, entry: &RecordingEntry) -> CoreResult<Vec<CamLine>> {
        Ok(from_cam(&self.raw(entry)?)?)
    }

    /// Decodes and summarizes a recording.
    pub fn summarize(&self, entry: &RecordingEntry) -> CoreResult<RecordingSummary> {
        RecordingSummary::decode(&self.raw(entry)?)
    }

    /// Finalizes an orphaned working file, returning the permanent name.
    ///
    /// With `dry_run` the checks run but nothing is renamed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyFinalized`] if the entry is not a working
    /// file or its permanent file already exists.
    pub fn recover(&self, entry: &RecordingEntry, dry_run: bool) -> CoreResult<String> {
        let target = entry.name.permanent_file_name();
        if !entry.is_working() || self.store.exists(&target)? {
            return Err(CoreError::already_finalized(target));
        }
        if !dry_run {
            self.store.rename(&entry.file_name, &target)?;
            info!(from = %entry.file_name, to = %target, "recovered working file");
        }
        Ok(target)
    }
}

impl std::fmt::Debug for RecordingCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingCatalog").finish_non_exhaustive()
    }
}
