//! Periodic flush/close cycle and its background thread.

use crate::config::SweepPolicy;
use crate::error::CoreResult;
use crate::finalizer::Finalizer;
use crate::registry::SessionRegistry;
use crate::stats::RecorderStats;
use crate::writer::DiskWriter;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleReport {
    /// Buffers detached by the sweep.
    pub detached: usize,
    /// Buffers appended to working files.
    pub flushed: usize,
    /// Sessions removed from the registry.
    pub closed: usize,
    /// Working files renamed to permanent names.
    pub finalized: usize,
}

/// One sweep followed by writing and finalizing its results.
///
/// Cycles are serialized by their own lock, separate from the registry
/// lock: producers keep appending while a cycle writes, but two cycles
/// never write the same session's buffers out of order.
pub struct SweepCycle {
    registry: Arc<SessionRegistry>,
    writer: DiskWriter,
    finalizer: Finalizer,
    policy: RwLock<SweepPolicy>,
    stats: Arc<RecorderStats>,
    cycle_lock: Mutex<()>,
}

impl SweepCycle {
    /// Creates a cycle.
    pub fn new(
        registry: Arc<SessionRegistry>,
        writer: DiskWriter,
        finalizer: Finalizer,
        policy: SweepPolicy,
        stats: Arc<RecorderStats>,
    ) -> Self {
        Self {
            registry,
            writer,
            finalizer,
            policy: RwLock::new(policy),
            stats,
            cycle_lock: Mutex::new(()),
        }
    }

    /// Returns the policy the next cycle will use.
    pub fn policy(&self) -> SweepPolicy {
        *self.policy.read()
    }

    /// Replaces the policy; takes effect on the next cycle.
    pub fn set_policy(&self, policy: SweepPolicy) {
        *self.policy.write() = policy;
    }

    /// Runs one cycle on the calling thread.
    ///
    /// Buffers are written before any file is renamed, so a closing
    /// session's last packets land in the working file first.
    pub fn run(&self, force_close_all: bool) -> CycleReport {
        let _cycle = self.cycle_lock.lock();
        let policy = self.policy();

        let outcome = self.registry.sweep(&policy, force_close_all);
        self.stats.record_sweep();
        if outcome.is_empty() {
            return CycleReport::default();
        }

        let report = CycleReport {
            detached: outcome.to_flush.len(),
            flushed: self.writer.write_all(&outcome.to_flush),
            closed: outcome.to_close.len(),
            finalized: self.finalizer.finalize_all(&outcome.to_close),
        };
        debug!(
            detached = report.detached,
            flushed = report.flushed,
            closed = report.closed,
            finalized = report.finalized,
            force_close_all,
            "sweep cycle complete"
        );
        report
    }
}

impl std::fmt::Debug for SweepCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SweepCycle")
            .field("policy", &self.policy())
            .finish_non_exhaustive()
    }
}

/// Cooperative stop request observed between cycles.
#[derive(Debug, Default)]
struct ShutdownSignal {
    requested: Mutex<bool>,
    condvar: Condvar,
}

impl ShutdownSignal {
    fn request(&self) {
        *self.requested.lock() = true;
        self.condvar.notify_all();
    }

    /// Waits up to one tick; returns whether shutdown was requested.
    fn wait_tick(&self, tick: Duration) -> bool {
        let deadline = Instant::now().checked_add(tick);
        let mut requested = self.requested.lock();
        while !*requested {
            match deadline {
                Some(deadline) => {
                    if self
                        .condvar
                        .wait_until(&mut requested, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
                // Tick too long to represent: only a request ends the wait
                None => self.condvar.wait(&mut requested),
            }
        }
        *requested
    }
}

/// The background thread driving [`SweepCycle`]s.
///
/// Every tick it runs one cycle. Once shutdown is requested it runs exactly
/// one more cycle with `force_close_all` set and exits. A request never
/// interrupts a cycle in progress; it only cuts the wait for the next tick
/// short.
#[derive(Debug)]
pub struct Sweeper {
    signal: Arc<ShutdownSignal>,
    handle: Option<JoinHandle<CycleReport>>,
}

impl Sweeper {
    /// Spawns the sweeper thread.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the thread cannot be spawned.
    pub fn spawn(cycle: Arc<SweepCycle>, tick: Duration) -> CoreResult<Self> {
        let signal = Arc::new(ShutdownSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name("camrec-sweeper".into())
            .spawn(move || run_loop(&cycle, &thread_signal, tick))?;

        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Requests shutdown and waits for the final cycle to finish.
    ///
    /// Returns the final cycle's report, or `None` if the sweeper was
    /// already stopped.
    pub fn shutdown(&mut self) -> Option<CycleReport> {
        self.signal.request();
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                warn!("sweeper thread panicked; final sweep did not complete");
                None
            }
        }
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run_loop(cycle: &SweepCycle, signal: &ShutdownSignal, tick: Duration) -> CycleReport {
    let tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX);
    info!(tick_ms, "sweeper started");

    while !signal.wait_tick(tick) {
        cycle.run(false);
    }

    let report = cycle.run(true);
    info!(
        closed = report.closed,
        finalized = report.finalized,
        "sweeper stopped after final sweep"
    );
    report
}
