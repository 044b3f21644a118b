//! Recorder configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Thresholds applied by every sweep.
///
/// The sweeper re-reads the policy each tick, so it may be changed while
/// the recorder runs (see [`Recorder::set_policy`](crate::Recorder::set_policy)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    /// A live session holding more packets than this is flushed.
    pub max_buffered_packets: usize,
    /// A session without packets for longer than this is closed.
    pub idle_timeout: Duration,
}

impl SweepPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(max_buffered_packets: usize, idle_timeout: Duration) -> Self {
        Self {
            max_buffered_packets,
            idle_timeout,
        }
    }

    /// Idle timeout in milliseconds, saturating.
    #[must_use]
    pub fn idle_timeout_millis(&self) -> i64 {
        i64::try_from(self.idle_timeout.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            max_buffered_packets: 1000,
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Configuration for opening a recorder.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Master switch. A disabled recorder hands out [`SessionId::DISABLED`](crate::SessionId::DISABLED).
    pub enabled: bool,

    /// Directory receiving recordings. Must already exist.
    pub directory: PathBuf,

    /// Flush and close thresholds.
    pub policy: SweepPolicy,

    /// Whether client-to-server packets are captured.
    pub record_input: bool,

    /// How long the sweeper waits between cycles.
    pub tick_interval: Duration,

    /// Whether to sync files and the directory after each write (safer but slower).
    pub sync_on_write: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("data/cams"),
            policy: SweepPolicy::default(),
            record_input: true,
            tick_interval: Duration::from_millis(250),
            sync_on_write: false,
        }
    }
}

impl RecorderConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the master switch.
    #[must_use]
    pub const fn enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    /// Sets the recordings directory.
    #[must_use]
    pub fn directory(mut self, path: impl AsRef<Path>) -> Self {
        self.directory = path.as_ref().to_path_buf();
        self
    }

    /// Sets the buffered packet count that triggers a mid-session flush.
    #[must_use]
    pub const fn max_buffered_packets(mut self, count: usize) -> Self {
        self.policy.max_buffered_packets = count;
        self
    }

    /// Sets the idle time after which a session is closed.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.policy.idle_timeout = timeout;
        self
    }

    /// Sets whether input packets are captured.
    #[must_use]
    pub const fn record_input(mut self, value: bool) -> Self {
        self.record_input = value;
        self
    }

    /// Sets the sweeper tick interval.
    #[must_use]
    pub const fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets whether writes are synced to disk.
    #[must_use]
    pub const fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }
}
