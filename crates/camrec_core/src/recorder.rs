//! Recorder facade.

use crate::clock::{Clock, SystemClock};
use crate::config::{RecorderConfig, SweepPolicy};
use crate::error::CoreResult;
use crate::finalizer::Finalizer;
use crate::registry::SessionRegistry;
use crate::stats::{RecorderStats, StatsSnapshot};
use crate::sweeper::{CycleReport, SweepCycle, Sweeper};
use crate::types::{SessionId, SessionOwner};
use crate::writer::DiskWriter;
use camrec_storage::{DirectoryStore, RecordingStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The session traffic recorder.
///
/// `Recorder` is the handle a host server keeps for the lifetime of the
/// process. It is `Send + Sync`; share it between connection threads with an
/// `Arc`.
///
/// # Opening a Recorder
///
/// ```rust,ignore
/// use camrec_core::{Recorder, RecorderConfig, SessionOwner};
///
/// let recorder = Recorder::open(RecorderConfig::new().directory("data/cams"));
///
/// let id = recorder.start_session(owner);
/// recorder.append_input(id, &request);
/// recorder.append_output(id, &response);
///
/// // Flushes and finalizes every open session.
/// recorder.request_shutdown();
/// ```
///
/// Opening never fails. If recording is switched off or the directory is
/// unusable the recorder is disabled: [`start_session`](Self::start_session)
/// returns [`SessionId::DISABLED`] and appends do nothing.
pub struct Recorder {
    /// Configuration the recorder was opened with.
    config: RecorderConfig,
    /// Active sessions.
    registry: Arc<SessionRegistry>,
    /// Flush/close cycle. None when disabled at open.
    cycle: Option<Arc<SweepCycle>>,
    /// Background thread. None once shut down.
    sweeper: Mutex<Option<Sweeper>>,
    /// Counters shared with every component.
    stats: Arc<RecorderStats>,
}

impl Recorder {
    /// Opens a recorder writing into `config.directory`.
    pub fn open(config: RecorderConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        if !config.enabled {
            info!("session recording is switched off");
            return Self::disabled_with(config, clock);
        }

        match DirectoryStore::open(&config.directory) {
            Ok(store) => {
                let store = store.with_sync(config.sync_on_write);
                Self::open_with_store(config, Arc::new(store), clock)
            }
            Err(err) => {
                warn!(
                    directory = %config.directory.display(),
                    error = %err,
                    "recordings directory unusable; session recording disabled"
                );
                Self::disabled_with(config, clock)
            }
        }
    }

    /// Opens a recorder over an arbitrary store and clock.
    ///
    /// `config.directory` is ignored; `config.enabled` is honoured.
    pub fn open_with_store(
        config: RecorderConfig,
        store: Arc<dyn RecordingStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::open_with_spawner(config, store, clock, Sweeper::spawn)
    }

    fn open_with_spawner<F>(
        config: RecorderConfig,
        store: Arc<dyn RecordingStore>,
        clock: Arc<dyn Clock>,
        spawn: F,
    ) -> Self
    where
        F: FnOnce(Arc<SweepCycle>, Duration) -> CoreResult<Sweeper>,
    {
        if !config.enabled {
            return Self::disabled_with(config, clock);
        }

        let stats = Arc::new(RecorderStats::new());
        let registry = Arc::new(SessionRegistry::new(Arc::clone(&clock), Arc::clone(&stats)));
        registry.set_record_input(config.record_input);

        let cycle = Arc::new(SweepCycle::new(
            Arc::clone(&registry),
            DiskWriter::new(Arc::clone(&store), Arc::clone(&stats)),
            Finalizer::new(store, Arc::clone(&stats)),
            config.policy,
            Arc::clone(&stats),
        ));

        let sweeper = match spawn(Arc::clone(&cycle), config.tick_interval) {
            Ok(sweeper) => sweeper,
            Err(err) => {
                warn!(error = %err, "could not start sweeper thread; session recording disabled");
                return Self::disabled_with(config, clock);
            }
        };

        info!(
            directory = %config.directory.display(),
            max_buffered_packets = config.policy.max_buffered_packets,
            idle_timeout_ms = config.policy.idle_timeout_millis(),
            record_input = config.record_input,
            "session recorder started"
        );

        Self {
            config,
            registry,
            cycle: Some(cycle),
            sweeper: Mutex::new(Some(sweeper)),
            stats,
        }
    }

    /// Creates a recorder that records nothing.
    pub fn disabled() -> Self {
        Self::disabled_with(RecorderConfig::new().enabled(false), Arc::new(SystemClock))
    }

    fn disabled_with(config: RecorderConfig, clock: Arc<dyn Clock>) -> Self {
        let stats = Arc::new(RecorderStats::new());
        Self {
            config,
            registry: Arc::new(SessionRegistry::disabled(clock, Arc::clone(&stats))),
            cycle: None,
            sweeper: Mutex::new(None),
            stats,
        }
    }

    /// Whether sessions are being recorded.
    pub fn is_enabled(&self) -> bool {
        self.registry.is_enabled()
    }

    /// Starts recording a session.
    ///
    /// Returns [`SessionId::DISABLED`] when disabled or shutting down.
    pub fn start_session(&self, owner: SessionOwner) -> SessionId {
        self.registry.start(owner)
    }

    /// Captures a client-to-server payload. The slice is copied.
    pub fn append_input(&self, id: SessionId, payload: &[u8]) {
        self.registry.append_input(id, payload);
    }

    /// Captures a server-to-client payload. The slice is copied.
    pub fn append_output(&self, id: SessionId, payload: &[u8]) {
        self.registry.append_output(id, payload);
    }

    /// Runs one flush/close cycle on the calling thread.
    pub fn sweep_now(&self) -> CycleReport {
        self.cycle
            .as_ref()
            .map(|cycle| cycle.run(false))
            .unwrap_or_default()
    }

    /// Stops accepting sessions, then flushes and finalizes all of them.
    ///
    /// Blocks until the sweeper's final cycle has completed. Returns that
    /// cycle's report, or `None` if there was no sweeper to stop.
    pub fn request_shutdown(&self) -> Option<CycleReport> {
        if self.registry.stop_accepting() && self.cycle.is_some() {
            info!("session recorder shutting down");
        }
        let mut sweeper = self.sweeper.lock().take()?;
        sweeper.shutdown()
    }

    /// Returns the current thresholds.
    pub fn policy(&self) -> SweepPolicy {
        self.cycle
            .as_ref()
            .map_or(self.config.policy, |cycle| cycle.policy())
    }

    /// Replaces the thresholds; the sweeper picks them up on its next tick.
    pub fn set_policy(&self, policy: SweepPolicy) {
        if let Some(cycle) = &self.cycle {
            cycle.set_policy(policy);
        }
    }

    /// Sets whether input packets are captured from now on.
    pub fn set_record_input(&self, value: bool) {
        self.registry.set_record_input(value);
    }

    /// Number of sessions currently being recorded.
    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the configuration the recorder was opened with.
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("enabled", &self.is_enabled())
            .field("directory", &self.config.directory)
            .field("active_sessions", &self.active_sessions())
            .finish_non_exhaustive()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        let _ = self.request_shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Timestamp;
    use camrec_storage::InMemoryStore;
    use std::io;
    use std::net::{IpAddr, Ipv4Addr};
    use tempfile::tempdir;

    fn owner(owner_id: u32) -> SessionOwner {
        SessionOwner::new(owner_id, 5, 77, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)))
    }

    fn in_memory(config: RecorderConfig) -> (Recorder, Arc<InMemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000)));
        let recorder = Recorder::open_with_store(
            config.tick_interval(Duration::from_secs(3600)),
            store.clone(),
            clock.clone(),
        );
        (recorder, store, clock)
    }

    #[test]
    fn recorder_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Recorder>();
    }

    #[test]
    fn disabled_recorder_ignores_everything() {
        let recorder = Recorder::disabled();
        assert!(!recorder.is_enabled());

        let id = recorder.start_session(owner(1));
        assert!(id.is_disabled());
        recorder.append_input(id, &[1]);
        recorder.append_output(id, &[2]);

        assert_eq!(recorder.sweep_now(), CycleReport::default());
        assert_eq!(recorder.active_sessions(), 0);
        assert!(recorder.request_shutdown().is_none());
        assert_eq!(recorder.stats().sessions_started, 0);
    }

    #[test]
    fn sweeper_spawn_failure_disables() {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000)));
        let recorder = Recorder::open_with_spawner(
            RecorderConfig::new(),
            store.clone(),
            clock,
            |_, _| Err(io::Error::new(io::ErrorKind::WouldBlock, "no threads left").into()),
        );

        assert!(!recorder.is_enabled());
        assert!(recorder.start_session(owner(1)).is_disabled());
        assert_eq!(recorder.sweep_now(), CycleReport::default());
        assert!(recorder.request_shutdown().is_none());
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn switched_off_config_disables() {
        let temp = tempdir().unwrap();
        let recorder = Recorder::open(RecorderConfig::new().enabled(false).directory(temp.path()));
        assert!(!recorder.is_enabled());
        assert_eq!(recorder.start_session(owner(1)), SessionId::DISABLED);
    }

    #[test]
    fn missing_directory_disables() {
        let temp = tempdir().unwrap();
        let recorder = Recorder::open(RecorderConfig::new().directory(temp.path().join("absent")));
        assert!(!recorder.is_enabled());
        assert_eq!(recorder.start_session(owner(1)), SessionId::DISABLED);
    }

    #[test]
    fn file_instead_of_directory_disables() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("cams");
        std::fs::write(&file, b"").unwrap();

        let recorder = Recorder::open(RecorderConfig::new().directory(&file));
        assert!(!recorder.is_enabled());
    }

    #[test]
    fn sweep_now_closes_idle_sessions() {
        let (recorder, store, clock) =
            in_memory(RecorderConfig::new().idle_timeout(Duration::from_secs(30)));
        let id = recorder.start_session(owner(42));
        clock.advance_millis(5);
        recorder.append_input(id, &[0x0a, 0xff]);

        assert_eq!(recorder.sweep_now().closed, 0);
        clock.advance(Duration::from_secs(31));
        let report = recorder.sweep_now();
        assert_eq!(report.closed, 1);
        assert_eq!(report.finalized, 1);

        assert_eq!(store.text("42.1000.cam").as_deref(), Some("> 5 0aff\n"));
        assert_eq!(recorder.active_sessions(), 0);
    }

    #[test]
    fn shutdown_finalizes_everything_and_refuses_new_sessions() {
        let (recorder, store, _clock) = in_memory(RecorderConfig::new());
        let a = recorder.start_session(owner(1));
        let b = recorder.start_session(owner(2));
        recorder.append_output(a, &[0x01]);
        recorder.append_input(b, &[0x02]);

        let report = recorder.request_shutdown().unwrap();
        assert_eq!(report.finalized, 2);
        assert_eq!(store.list().unwrap(), vec!["1.1000.cam", "2.1000.cam"]);

        assert!(recorder.start_session(owner(3)).is_disabled());
        assert!(recorder.request_shutdown().is_none());
    }

    #[test]
    fn drop_finalizes_open_sessions() {
        let (recorder, store, _clock) = in_memory(RecorderConfig::new());
        let id = recorder.start_session(owner(8));
        recorder.append_output(id, &[0xab]);
        drop(recorder);

        assert_eq!(store.text("8.1000.cam").as_deref(), Some("< 0 ab\n"));
    }

    #[test]
    fn record_input_can_be_toggled() {
        let (recorder, store, _clock) = in_memory(RecorderConfig::new().record_input(false));
        let id = recorder.start_session(owner(4));
        recorder.append_input(id, &[1]);
        recorder.set_record_input(true);
        recorder.append_input(id, &[2]);
        recorder.request_shutdown();

        assert_eq!(store.text("4.1000.cam").as_deref(), Some("> 0 02\n"));
    }

    #[test]
    fn policy_is_adjustable_at_runtime() {
        let (recorder, store, _clock) = in_memory(RecorderConfig::new().max_buffered_packets(10));
        assert_eq!(recorder.policy().max_buffered_packets, 10);

        let id = recorder.start_session(owner(6));
        recorder.append_output(id, &[1]);
        recorder.append_output(id, &[2]);
        assert_eq!(recorder.sweep_now().flushed, 0);

        recorder.set_policy(SweepPolicy::new(1, Duration::from_secs(60)));
        assert_eq!(recorder.sweep_now().flushed, 1);
        assert!(store.exists("6.1000.cam.tmp").unwrap());
        assert_eq!(recorder.active_sessions(), 1);
    }

    #[test]
    fn stats_follow_activity() {
        let (recorder, _store, _clock) = in_memory(RecorderConfig::new());
        let id = recorder.start_session(owner(1));
        recorder.append_input(id, &[1, 2, 3]);
        recorder.append_output(id, &[4]);
        recorder.append_output(SessionId::new(999), &[5]);
        recorder.request_shutdown();

        let stats = recorder.stats();
        assert_eq!(stats.sessions_started, 1);
        assert_eq!(stats.sessions_closed, 1);
        assert_eq!(stats.input_packets, 1);
        assert_eq!(stats.output_packets, 1);
        assert_eq!(stats.bytes_captured, 4);
        assert_eq!(stats.packets_dropped, 1);
        assert_eq!(stats.packets_written, 2);
        assert_eq!(stats.renames, 1);
    }

    #[test]
    fn directory_store_end_to_end() {
        let temp = tempdir().unwrap();
        let recorder = Recorder::open(
            RecorderConfig::new()
                .directory(temp.path())
                .tick_interval(Duration::from_secs(3600)),
        );
        assert!(recorder.is_enabled());

        let id = recorder.start_session(owner(3));
        recorder.append_output(id, &[0xde, 0xad]);
        recorder.request_shutdown();

        let names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("3.") && names[0].ends_with(".cam"));

        let content = std::fs::read_to_string(temp.path().join(&names[0])).unwrap();
        assert!(content.starts_with("< ") && content.ends_with(" dead\n"));
    }
}
