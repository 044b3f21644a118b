//! Working file writer.

use crate::error::CoreResult;
use crate::session::DetachedSession;
use crate::stats::RecorderStats;
use camrec_codec::LineEncoder;
use camrec_storage::RecordingStore;
use std::sync::Arc;
use tracing::warn;

/// Appends detached buffers to their sessions' working files.
///
/// Each buffer is rendered to text in memory and handed to the store in one
/// append, so the file is opened and closed once per session per sweep.
pub struct DiskWriter {
    store: Arc<dyn RecordingStore>,
    stats: Arc<RecorderStats>,
}

impl DiskWriter {
    /// Creates a writer over a store.
    pub fn new(store: Arc<dyn RecordingStore>, stats: Arc<RecorderStats>) -> Self {
        Self { store, stats }
    }

    /// Appends one session's packets to its working file.
    ///
    /// The working file is created even when there are no packets, so that
    /// a closed session always has a file to finalize.
    ///
    /// Returns the number of packets written.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the append fails; the packets are then
    /// lost.
    pub fn write(&self, session: &DetachedSession) -> CoreResult<usize> {
        let start_time = session.identity.start_time;
        let mut encoder = LineEncoder::with_capacity(
            session.packets.iter().map(|p| p.payload.len() * 2 + 24).sum(),
        );
        for packet in &session.packets {
            encoder.push(
                packet.direction,
                packet.timestamp.millis_since(start_time),
                &packet.payload,
            );
        }

        let file_name = session.identity.recording_name().working_file_name();
        self.store.append(&file_name, encoder.as_bytes())?;
        Ok(encoder.line_count())
    }

    /// Writes every buffer, logging and skipping failures.
    ///
    /// Returns the number of sessions written successfully.
    pub fn write_all(&self, sessions: &[DetachedSession]) -> usize {
        let mut written = 0;
        for session in sessions {
            match self.write(session) {
                Ok(packets) => {
                    self.stats.record_flush(packets);
                    written += 1;
                }
                Err(e) => {
                    self.stats.record_write_failure(session.len());
                    warn!(
                        session = %session.identity.id,
                        file = %session.identity.recording_name().working_file_name(),
                        lost_packets = session.len(),
                        error = %e,
                        "cannot append to working file"
                    );
                }
            }
        }
        written
    }
}

impl std::fmt::Debug for DiskWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskWriter").finish_non_exhaustive()
    }
}
