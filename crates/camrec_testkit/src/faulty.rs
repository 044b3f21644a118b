//! Fault injection for recording stores.
//!
//! [`FaultyStore`] wraps any [`RecordingStore`] and fails appends or renames
//! on demand, so tests can check that a broken disk costs packets but never
//! stalls the recorder or leaks into other sessions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camrec_testkit::FaultyStore;
//!
//! let store = FaultyStore::in_memory();
//! store.fail_appends_for("7.");
//! // appends to any file starting with "7." now fail
//! ```

use camrec_storage::{InMemoryStore, RecordingStore, StorageError, StorageResult};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// A store wrapper that can simulate I/O failures.
pub struct FaultyStore {
    inner: Arc<dyn RecordingStore>,
    fail_appends: AtomicBool,
    fail_renames: AtomicBool,
    fail_appends_after: AtomicUsize,
    failing_prefix: Mutex<Option<String>>,
    appends: AtomicUsize,
    failed_appends: AtomicUsize,
    failed_renames: AtomicUsize,
}

impl FaultyStore {
    /// Creates a faulty store wrapping an inner store. No faults are armed.
    pub fn new(inner: Arc<dyn RecordingStore>) -> Self {
        Self {
            inner,
            fail_appends: AtomicBool::new(false),
            fail_renames: AtomicBool::new(false),
            fail_appends_after: AtomicUsize::new(usize::MAX),
            failing_prefix: Mutex::new(None),
            appends: AtomicUsize::new(0),
            failed_appends: AtomicUsize::new(0),
            failed_renames: AtomicUsize::new(0),
        }
    }

    /// Creates a faulty store over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &Arc<dyn RecordingStore> {
        &self.inner
    }

    /// Sets whether every append fails.
    pub fn set_fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// Sets whether every rename fails.
    pub fn set_fail_renames(&self, fail: bool) {
        self.fail_renames.store(fail, Ordering::SeqCst);
    }

    /// Lets `count` more appends succeed, then fails the rest.
    pub fn fail_appends_after(&self, count: usize) {
        let done = self.appends.load(Ordering::SeqCst);
        self.fail_appends_after
            .store(done.saturating_add(count), Ordering::SeqCst);
    }

    /// Fails appends to files whose name starts with `prefix`.
    pub fn fail_appends_for(&self, prefix: &str) {
        *self.failing_prefix.lock() = Some(prefix.to_string());
    }

    /// Disarms every fault. Counters are kept.
    pub fn reset(&self) {
        self.fail_appends.store(false, Ordering::SeqCst);
        self.fail_renames.store(false, Ordering::SeqCst);
        self.fail_appends_after.store(usize::MAX, Ordering::SeqCst);
        *self.failing_prefix.lock() = None;
    }

    /// Number of appends that were rejected.
    pub fn failed_appends(&self) -> usize {
        self.failed_appends.load(Ordering::SeqCst)
    }

    /// Number of renames that were rejected.
    pub fn failed_renames(&self) -> usize {
        self.failed_renames.load(Ordering::SeqCst)
    }

    fn append_should_fail(&self, name: &str) -> bool {
        if self.fail_appends.load(Ordering::SeqCst) {
            return true;
        }
        let prefix_hit = self
            .failing_prefix
            .lock()
            .as_deref()
            .is_some_and(|p| name.starts_with(p));
        if prefix_hit {
            return true;
        }
        let attempt = self.appends.fetch_add(1, Ordering::SeqCst);
        attempt >= self.fail_appends_after.load(Ordering::SeqCst)
    }
}

fn simulated(what: &str) -> StorageError {
    StorageError::Io(std::io::Error::new(
        std::io::ErrorKind::Other,
        format!("simulated {what} failure"),
    ))
}

impl RecordingStore for FaultyStore {
    fn append(&self, name: &str, data: &[u8]) -> StorageResult<u64> {
        if self.append_should_fail(name) {
            self.failed_appends.fetch_add(1, Ordering::SeqCst);
            return Err(simulated("append"));
        }
        self.inner.append(name, data)
    }

    fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        if self.fail_renames.load(Ordering::SeqCst) {
            self.failed_renames.fetch_add(1, Ordering::SeqCst);
            return Err(simulated("rename"));
        }
        self.inner.rename(from, to)
    }

    fn read(&self, name: &str) -> StorageResult<Vec<u8>> {
        self.inner.read(name)
    }

    fn exists(&self, name: &str) -> StorageResult<bool> {
        self.inner.exists(name)
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        self.inner.list()
    }
}

impl std::fmt::Debug for FaultyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStore")
            .field("failed_appends", &self.failed_appends())
            .field("failed_renames", &self.failed_renames())
            .finish_non_exhaustive()
    }
}
