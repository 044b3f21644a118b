//! Recorder fixtures.
//!
//! Provides recorders over temporary directories or memory whose time is
//! driven by hand, plus helpers for reading back what they wrote.

use crate::faulty::FaultyStore;
use camrec_core::{
    CamLine, ManualClock, Recorder, RecorderConfig, RecordingCatalog, SessionOwner, Timestamp,
};
use camrec_storage::{DirectoryStore, InMemoryStore, RecordingStore};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Start time of every fixture clock, in epoch milliseconds.
pub const TEST_EPOCH: i64 = 1_700_000_000_000;

/// A tick interval long enough that the background sweeper only runs its
/// final cycle; tests drive cycles with [`Recorder::sweep_now`].
pub const MANUAL_TICK: Duration = Duration::from_secs(24 * 60 * 60);

/// A recorder under test with automatic cleanup.
pub struct TestRecorder {
    /// The recorder instance.
    pub recorder: Recorder,
    /// The clock the recorder reads.
    pub clock: Arc<ManualClock>,
    /// The store the recorder writes to, with faults disarmed.
    pub store: Arc<FaultyStore>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestRecorder {
    /// Creates a recorder writing to memory.
    pub fn memory(config: RecorderConfig) -> Self {
        Self::build(config, Arc::new(InMemoryStore::new()), None)
    }

    /// Creates a recorder writing to a fresh temporary directory.
    pub fn directory(config: RecorderConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = DirectoryStore::open(temp_dir.path()).expect("Failed to open directory store");
        let config = config.directory(temp_dir.path());
        Self::build(config, Arc::new(store), Some(temp_dir))
    }

    fn build(
        config: RecorderConfig,
        inner: Arc<dyn RecordingStore>,
        temp_dir: Option<TempDir>,
    ) -> Self {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(TEST_EPOCH)));
        let store = Arc::new(FaultyStore::new(inner));
        let recorder = Recorder::open_with_store(
            config.tick_interval(MANUAL_TICK),
            store.clone(),
            clock.clone(),
        );
        Self {
            recorder,
            clock,
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the recordings directory if file-based, None if in-memory.
    pub fn path(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Advances the clock.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Returns every file name in the store, sorted.
    pub fn file_names(&self) -> Vec<String> {
        self.store.list().expect("Failed to list recordings")
    }

    /// Returns a file's contents as text, if it exists.
    pub fn read_text(&self, name: &str) -> Option<String> {
        if !self.store.exists(name).ok()? {
            return None;
        }
        let bytes = self.store.read(name).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Returns a catalog over the store.
    pub fn catalog(&self) -> RecordingCatalog {
        RecordingCatalog::new(self.store.clone())
    }

    /// Decodes the permanent recording of `owner_id` started at `start`.
    pub fn load_permanent(&self, owner_id: u32, start: i64) -> Vec<CamLine> {
        let catalog = self.catalog();
        let entry = catalog
            .find(&permanent_name(owner_id, start))
            .expect("Permanent recording missing");
        catalog.load(&entry).expect("Failed to decode recording")
    }
}

impl std::ops::Deref for TestRecorder {
    type Target = Recorder;

    fn deref(&self) -> &Self::Target {
        &self.recorder
    }
}

/// An owner with deterministic metadata.
pub fn owner(owner_id: u32) -> SessionOwner {
    SessionOwner::new(
        owner_id,
        owner_id % 100,
        10_000 + owner_id,
        IpAddr::V4(Ipv4Addr::new(10, 0, (owner_id >> 8) as u8, owner_id as u8)),
    )
}

/// The permanent file name for `owner_id` started at `start`.
pub fn permanent_name(owner_id: u32, start: i64) -> String {
    format!("{owner_id}.{start}.cam")
}

/// The working file name for `owner_id` started at `start`.
pub fn working_name(owner_id: u32, start: i64) -> String {
    format!("{owner_id}.{start}.cam.tmp")
}

/// Runs a test with an in-memory recorder.
///
/// # Example
///
/// ```rust,ignore
/// use camrec_testkit::{owner, with_memory_recorder};
///
/// with_memory_recorder(RecorderConfig::new(), |rec| {
///     let id = rec.start_session(owner(1));
///     rec.append_input(id, &[0x0a]);
/// });
/// ```
pub fn with_memory_recorder<F, R>(config: RecorderConfig, f: F) -> R
where
    F: FnOnce(&TestRecorder) -> R,
{
    let rec = TestRecorder::memory(config);
    f(&rec)
}
