//! Recorder statistics.
//!
//! Counters let operators alert on sustained disk trouble: the recorder
//! never disables itself after write failures, it only counts them.

use camrec_codec::Direction;
use std::sync::atomic::{AtomicU64, Ordering};

/// Recorder counters.
///
/// All counters are atomic and monotonically increasing.
#[derive(Debug, Default)]
pub struct RecorderStats {
    sessions_started: AtomicU64,
    sessions_closed: AtomicU64,
    input_packets: AtomicU64,
    output_packets: AtomicU64,
    bytes_captured: AtomicU64,
    packets_dropped: AtomicU64,
    sweeps: AtomicU64,
    flushes: AtomicU64,
    packets_written: AtomicU64,
    write_failures: AtomicU64,
    packets_lost: AtomicU64,
    renames: AtomicU64,
    rename_failures: AtomicU64,
}

impl RecorderStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_session_start(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture(&self, direction: Direction, bytes: usize) {
        let counter = match direction {
            Direction::Input => &self.input_packets,
            Direction::Output => &self.output_packets,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.bytes_captured
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_drop(&self) {
        self.packets_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self) {
        self.sweeps.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, packets: usize) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.packets_written
            .fetch_add(packets as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self, packets: usize) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
        self.packets_lost.fetch_add(packets as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self) {
        self.sessions_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rename(&self) {
        self.renames.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rename_failure(&self) {
        self.rename_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a snapshot of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        StatsSnapshot {
            sessions_started: load(&self.sessions_started),
            sessions_closed: load(&self.sessions_closed),
            input_packets: load(&self.input_packets),
            output_packets: load(&self.output_packets),
            bytes_captured: load(&self.bytes_captured),
            packets_dropped: load(&self.packets_dropped),
            sweeps: load(&self.sweeps),
            flushes: load(&self.flushes),
            packets_written: load(&self.packets_written),
            write_failures: load(&self.write_failures),
            packets_lost: load(&self.packets_lost),
            renames: load(&self.renames),
            rename_failures: load(&self.rename_failures),
        }
    }
}

/// A point-in-time copy of [`RecorderStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Sessions handed a non-zero id.
    pub sessions_started: u64,
    /// Sessions removed from the registry (idle or shutdown).
    pub sessions_closed: u64,
    /// Input packets buffered.
    pub input_packets: u64,
    /// Output packets buffered.
    pub output_packets: u64,
    /// Payload bytes buffered.
    pub bytes_captured: u64,
    /// Appends to unknown (already closed) sessions.
    pub packets_dropped: u64,
    /// Sweeps run.
    pub sweeps: u64,
    /// Successful working-file appends.
    pub flushes: u64,
    /// Packets written to working files.
    pub packets_written: u64,
    /// Working-file appends that failed.
    pub write_failures: u64,
    /// Detached packets discarded by failed appends.
    pub packets_lost: u64,
    /// Working files renamed to permanent names.
    pub renames: u64,
    /// Renames that failed, leaving an orphaned working file.
    pub rename_failures: u64,
}

impl StatsSnapshot {
    /// Total packets buffered in either direction.
    pub fn packets_captured(&self) -> u64 {
        self.input_packets + self.output_packets
    }
}
