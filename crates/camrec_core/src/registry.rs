//! Concurrent registry of active recording sessions.

use crate::clock::Clock;
use crate::config::SweepPolicy;
use crate::session::{DetachedSession, Packet, Session, SessionIdentity};
use crate::stats::RecorderStats;
use crate::types::{SessionId, SessionOwner, Timestamp};
use bytes::Bytes;
use camrec_codec::Direction;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Result of one sweep.
///
/// Every session in `to_close` also has its final buffer in `to_flush`,
/// and appears earlier there than in any later sweep.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Buffers to append to working files, in session id order.
    pub to_flush: Vec<DetachedSession>,
    /// Sessions removed from the registry whose files must be finalized.
    pub to_close: Vec<SessionIdentity>,
}

impl SweepOutcome {
    /// Whether the sweep found nothing to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_flush.is_empty() && self.to_close.is_empty()
    }
}

#[derive(Debug)]
struct RegistryState {
    /// Cleared by [`SessionRegistry::stop_accepting`]; existing sessions keep recording.
    accepting: bool,
    next_id: u64,
    sessions: BTreeMap<SessionId, Session>,
    /// Latest start time handed out per owner, kept until the clock passes it.
    recent_starts: BTreeMap<u32, Timestamp>,
}

/// The single source of truth for active sessions.
///
/// All session state sits behind one mutex. It is held only for map lookups
/// and buffer mutation; no I/O ever happens under it. Producers call
/// [`start`](Self::start) and the `append_*` methods from any thread, the
/// sweeper calls [`sweep`](Self::sweep).
///
/// # Example
///
/// ```rust
/// use camrec_core::{RecorderStats, SessionOwner, SessionRegistry, SweepPolicy, SystemClock};
/// use std::sync::Arc;
///
/// let registry = SessionRegistry::new(Arc::new(SystemClock), Arc::new(RecorderStats::new()));
/// let id = registry.start(SessionOwner::new(1, 1, 1, "127.0.0.1".parse().unwrap()));
/// registry.append_output(id, b"hello");
///
/// let outcome = registry.sweep(&SweepPolicy::default(), true);
/// assert_eq!(outcome.to_flush[0].packets.len(), 1);
/// assert!(!registry.contains(id));
/// ```
#[derive(Debug)]
pub struct SessionRegistry {
    state: Mutex<RegistryState>,
    enabled: AtomicBool,
    record_input: AtomicBool,
    clock: Arc<dyn Clock>,
    stats: Arc<RecorderStats>,
}

impl SessionRegistry {
    /// Creates an enabled registry recording both directions.
    pub fn new(clock: Arc<dyn Clock>, stats: Arc<RecorderStats>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                accepting: true,
                next_id: 1,
                sessions: BTreeMap::new(),
                recent_starts: BTreeMap::new(),
            }),
            enabled: AtomicBool::new(true),
            record_input: AtomicBool::new(true),
            clock,
            stats,
        }
    }

    /// Creates a permanently disabled registry.
    pub fn disabled(clock: Arc<dyn Clock>, stats: Arc<RecorderStats>) -> Self {
        let registry = Self::new(clock, stats);
        registry.disable();
        registry
    }

    /// Turns the registry off for good.
    pub(crate) fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    /// Whether the registry records anything at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Sets whether input packets are captured.
    pub fn set_record_input(&self, value: bool) {
        self.record_input.store(value, Ordering::Relaxed);
    }

    /// Whether input packets are captured.
    pub fn record_input(&self) -> bool {
        self.record_input.load(Ordering::Relaxed)
    }

    /// Refuses new sessions from now on; used when shutting down.
    ///
    /// Returns whether the registry was still accepting.
    pub fn stop_accepting(&self) -> bool {
        std::mem::replace(&mut self.state.lock().accepting, false)
    }

    /// Starts a new session and returns its id.
    ///
    /// Returns [`SessionId::DISABLED`] if the registry is disabled or
    /// shutting down.
    ///
    /// A second session of the same owner starting in the same millisecond
    /// gets its start time pushed forward by one, so every recording file
    /// name handed out by this registry is distinct.
    pub fn start(&self, owner: SessionOwner) -> SessionId {
        if !self.is_enabled() {
            return SessionId::DISABLED;
        }

        let mut state = self.state.lock();
        if !state.accepting {
            return SessionId::DISABLED;
        }

        let id = SessionId::new(state.next_id);
        state.next_id += 1;
        let now = self.clock.now();
        let start_time = match state.recent_starts.get(&owner.owner_id) {
            Some(last) if *last >= now => Timestamp::from_millis(last.as_millis().saturating_add(1)),
            _ => now,
        };
        state.recent_starts.insert(owner.owner_id, start_time);
        state.sessions.insert(id, Session::new(id, owner, start_time));
        drop(state);

        self.stats.record_session_start();
        trace!(session = %id, owner_id = owner.owner_id, start_time = %start_time, "session started");
        id
    }

    /// Captures a client-to-server payload.
    pub fn append_input(&self, id: SessionId, payload: &[u8]) {
        if !self.record_input() {
            return;
        }
        self.append(id, Direction::Input, payload);
    }

    /// Captures a server-to-client payload.
    pub fn append_output(&self, id: SessionId, payload: &[u8]) {
        self.append(id, Direction::Output, payload);
    }

    fn append(&self, id: SessionId, direction: Direction, payload: &[u8]) {
        if id.is_disabled() || !self.is_enabled() {
            return;
        }

        // Copy outside the lock
        let payload = Bytes::copy_from_slice(payload);
        let len = payload.len();

        let mut state = self.state.lock();
        match state.sessions.get_mut(&id) {
            Some(session) => {
                // Never before the start time, which may lead the clock
                let timestamp = self.clock.now().max(session.identity().start_time);
                session.push(Packet {
                    timestamp,
                    direction,
                    payload,
                });
                drop(state);
                self.stats.record_capture(direction, len);
            }
            None => {
                // Closed by a concurrent sweep
                drop(state);
                self.stats.record_drop();
                trace!(session = %id, %direction, "dropped packet for unknown session");
            }
        }
    }

    /// Classifies every session in one pass under the lock.
    ///
    /// - idle longer than `policy.idle_timeout`, or `force_close_all`:
    ///   buffer detached into `to_flush`, identity into `to_close`, session
    ///   removed
    /// - more than `policy.max_buffered_packets` buffered: buffer detached
    ///   into `to_flush` and replaced by an empty one
    /// - otherwise untouched
    pub fn sweep(&self, policy: &SweepPolicy, force_close_all: bool) -> SweepOutcome {
        let idle_timeout = policy.idle_timeout_millis();
        let mut outcome = SweepOutcome::default();

        let mut state = self.state.lock();
        let now = self.clock.now();
        state.sessions.retain(|_, session| {
            if force_close_all || now.millis_since(session.last_activity()) > idle_timeout {
                outcome.to_flush.push(session.detach());
                outcome.to_close.push(session.identity());
                false
            } else if session.buffered() > policy.max_buffered_packets {
                outcome.to_flush.push(session.detach());
                true
            } else {
                true
            }
        });
        state.recent_starts.retain(|_, start| *start >= now);
        drop(state);

        for _ in &outcome.to_close {
            self.stats.record_close();
        }
        outcome
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Whether there are no active sessions.
    pub fn is_empty(&self) -> bool {
        self.state.lock().sessions.is_empty()
    }

    /// Whether the session is still active.
    pub fn contains(&self, id: SessionId) -> bool {
        self.state.lock().sessions.contains_key(&id)
    }

    /// Number of packets buffered for an active session.
    pub fn buffered_packets(&self, id: SessionId) -> Option<usize> {
        self.state.lock().sessions.get(&id).map(Session::buffered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::Timestamp;
    use proptest::prelude::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::thread;
    use std::time::Duration;

    fn owner(owner_id: u32) -> SessionOwner {
        SessionOwner::new(owner_id, 10, 20, IpAddr::V4(Ipv4Addr::new(192, 168, 0, 2)))
    }

    fn create_registry() -> (SessionRegistry, Arc<ManualClock>, Arc<RecorderStats>) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_millis(1_000_000)));
        let stats = Arc::new(RecorderStats::new());
        let registry = SessionRegistry::new(clock.clone(), Arc::clone(&stats));
        (registry, clock, stats)
    }

    fn policy(max_buffered_packets: usize, idle_secs: u64) -> SweepPolicy {
        SweepPolicy::new(max_buffered_packets, Duration::from_secs(idle_secs))
    }

    fn payloads(detached: &DetachedSession) -> Vec<Vec<u8>> {
        detached.packets.iter().map(|p| p.payload.to_vec()).collect()
    }

    #[test]
    fn ids_are_monotonic_and_non_zero() {
        let (registry, _, stats) = create_registry();
        let a = registry.start(owner(1));
        let b = registry.start(owner(1));
        let c = registry.start(owner(2));

        assert_eq!(a, SessionId::new(1));
        assert!(a < b && b < c);
        assert_eq!(registry.len(), 3);
        assert_eq!(stats.snapshot().sessions_started, 3);
    }

    #[test]
    fn ids_are_not_reused_after_close() {
        let (registry, _, _) = create_registry();
        let first = registry.start(owner(1));
        registry.sweep(&SweepPolicy::default(), true);

        let second = registry.start(owner(1));
        assert!(second > first);
    }

    #[test]
    fn same_owner_same_instant_gets_distinct_names() {
        let (registry, clock, _) = create_registry();
        let a = registry.start(owner(7));
        let b = registry.start(owner(7));
        let other = registry.start(owner(8));
        registry.append_output(b, &[0xbb]);

        let outcome = registry.sweep(&SweepPolicy::default(), true);
        let names: Vec<_> = outcome
            .to_close
            .iter()
            .map(|identity| identity.recording_name().permanent_file_name())
            .collect();
        assert_eq!(names, vec!["7.1000000.cam", "7.1000001.cam", "8.1000000.cam"]);
        assert_eq!(outcome.to_close[0].id, a);
        assert_eq!(outcome.to_close[2].id, other);

        // The packet is not stamped before its session's start
        let flushed = &outcome.to_flush[1];
        assert_eq!(flushed.identity.id, b);
        assert_eq!(flushed.packets[0].timestamp.millis_since(flushed.identity.start_time), 0);

        // Once the clock has moved on, the owner starts at the clock again
        clock.advance_millis(5);
        registry.start(owner(7));
        let outcome = registry.sweep(&SweepPolicy::default(), true);
        assert_eq!(outcome.to_close[0].start_time, Timestamp::from_millis(1_000_005));
    }

    #[test]
    fn disabled_registry_is_inert() {
        let clock = Arc::new(ManualClock::default());
        let stats = Arc::new(RecorderStats::new());
        let registry = SessionRegistry::disabled(clock, Arc::clone(&stats));

        let id = registry.start(owner(1));
        assert_eq!(id, SessionId::DISABLED);
        registry.append_input(id, &[1]);
        registry.append_output(SessionId::new(1), &[1]);

        assert!(registry.is_empty());
        assert!(registry.sweep(&SweepPolicy::default(), true).is_empty());
        assert_eq!(stats.snapshot(), crate::StatsSnapshot::default());
    }

    #[test]
    fn append_records_both_directions_in_order() {
        let (registry, clock, _) = create_registry();
        let id = registry.start(owner(1));

        registry.append_input(id, &[1]);
        clock.advance_millis(3);
        registry.append_output(id, &[2, 2]);
        registry.append_input(id, &[3]);

        let outcome = registry.sweep(&SweepPolicy::default(), true);
        let detached = &outcome.to_flush[0];
        assert_eq!(payloads(detached), vec![vec![1], vec![2, 2], vec![3]]);
        assert_eq!(detached.packets[0].direction, Direction::Input);
        assert_eq!(detached.packets[1].direction, Direction::Output);
        assert_eq!(
            detached.packets[1].timestamp.millis_since(detached.identity.start_time),
            3
        );
    }

    #[test]
    fn payload_is_copied() {
        let (registry, _, _) = create_registry();
        let id = registry.start(owner(1));

        let mut buffer = vec![0xaa, 0xbb];
        registry.append_output(id, &buffer);
        buffer[0] = 0x00;
        buffer.clear();

        let outcome = registry.sweep(&SweepPolicy::default(), true);
        assert_eq!(payloads(&outcome.to_flush[0]), vec![vec![0xaa, 0xbb]]);
    }

    #[test]
    fn input_capture_can_be_switched_off() {
        let (registry, _, stats) = create_registry();
        let id = registry.start(owner(1));

        registry.set_record_input(false);
        registry.append_input(id, &[1]);
        registry.append_output(id, &[2]);
        registry.set_record_input(true);
        registry.append_input(id, &[3]);

        assert_eq!(registry.buffered_packets(id), Some(2));
        assert_eq!(stats.snapshot().input_packets, 1);
        assert_eq!(stats.snapshot().packets_dropped, 0);
    }

    #[test]
    fn unknown_session_is_silently_dropped() {
        let (registry, _, stats) = create_registry();
        registry.append_output(SessionId::new(99), &[1]);
        registry.append_input(SessionId::new(99), &[1]);

        assert!(registry.is_empty());
        assert_eq!(stats.snapshot().packets_dropped, 2);
    }

    #[test]
    fn idle_session_is_closed() {
        let (registry, clock, stats) = create_registry();
        let id = registry.start(owner(7));
        registry.append_input(id, &[1]);

        clock.advance(Duration::from_secs(30));
        let outcome = registry.sweep(&policy(100, 30), false);
        assert!(outcome.is_empty(), "exactly the threshold is not idle");

        clock.advance(Duration::from_secs(1));
        let outcome = registry.sweep(&policy(100, 30), false);
        assert_eq!(outcome.to_flush.len(), 1);
        assert_eq!(outcome.to_close.len(), 1);
        assert_eq!(outcome.to_close[0].id, id);
        assert!(!registry.contains(id));
        assert_eq!(stats.snapshot().sessions_closed, 1);
    }

    #[test]
    fn activity_postpones_idle_close() {
        let (registry, clock, _) = create_registry();
        let id = registry.start(owner(7));

        clock.advance(Duration::from_secs(20));
        registry.append_output(id, &[1]);
        clock.advance(Duration::from_secs(20));

        assert!(registry.sweep(&policy(100, 30), false).is_empty());
        assert!(registry.contains(id));
    }

    #[test]
    fn full_buffer_is_flushed_and_session_stays() {
        let (registry, _, _) = create_registry();
        let id = registry.start(owner(1));
        for i in 0..3u8 {
            registry.append_output(id, &[i]);
        }

        assert!(registry.sweep(&policy(3, 60), false).is_empty());

        registry.append_output(id, &[3]);
        let outcome = registry.sweep(&policy(3, 60), false);
        assert_eq!(outcome.to_flush.len(), 1);
        assert!(outcome.to_close.is_empty());
        assert_eq!(payloads(&outcome.to_flush[0]).len(), 4);
        assert_eq!(registry.buffered_packets(id), Some(0));

        registry.append_output(id, &[4]);
        let outcome = registry.sweep(&SweepPolicy::default(), true);
        assert_eq!(payloads(&outcome.to_flush[0]), vec![vec![4]]);
    }

    #[test]
    fn force_close_takes_everything() {
        let (registry, _, _) = create_registry();
        let a = registry.start(owner(1));
        let b = registry.start(owner(2));
        registry.append_output(a, &[1]);

        let outcome = registry.sweep(&policy(100, 3600), true);
        let closed: Vec<_> = outcome.to_close.iter().map(|i| i.id).collect();
        assert_eq!(closed, vec![a, b]);
        assert_eq!(outcome.to_flush.len(), 2);
        assert!(outcome.to_flush[1].is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn closed_session_is_never_swept_again() {
        let (registry, clock, stats) = create_registry();
        let id = registry.start(owner(1));
        clock.advance(Duration::from_secs(61));
        assert_eq!(registry.sweep(&SweepPolicy::default(), false).to_close.len(), 1);

        registry.append_output(id, &[1]);
        assert!(registry.sweep(&SweepPolicy::default(), false).is_empty());
        assert!(registry.sweep(&SweepPolicy::default(), true).is_empty());
        assert_eq!(stats.snapshot().sessions_closed, 1);
        assert_eq!(stats.snapshot().packets_dropped, 1);
    }

    #[test]
    fn stop_accepting_keeps_existing_sessions() {
        let (registry, _, _) = create_registry();
        let id = registry.start(owner(1));

        assert!(registry.stop_accepting());
        assert!(!registry.stop_accepting());
        assert_eq!(registry.start(owner(2)), SessionId::DISABLED);

        registry.append_output(id, &[1]);
        assert_eq!(registry.buffered_packets(id), Some(1));
    }

    #[test]
    fn concurrent_detach_never_loses_or_duplicates() {
        let (registry, _, _) = create_registry();
        let registry = Arc::new(registry);
        let id = registry.start(owner(1));
        const PACKETS: u32 = 5_000;

        let producer = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..PACKETS {
                    registry.append_output(id, &i.to_le_bytes());
                }
            })
        };

        let mut seen = Vec::new();
        while !producer.is_finished() {
            for detached in registry.sweep(&policy(0, 3600), false).to_flush {
                seen.extend(detached.packets);
            }
        }
        producer.join().unwrap();
        for detached in registry.sweep(&SweepPolicy::default(), true).to_flush {
            seen.extend(detached.packets);
        }

        let values: Vec<u32> = seen
            .iter()
            .map(|p| u32::from_le_bytes(p.payload.as_ref().try_into().unwrap()))
            .collect();
        assert_eq!(values, (0..PACKETS).collect::<Vec<_>>());
    }

    #[test]
    fn concurrent_producers_keep_sessions_apart() {
        let (registry, _, _) = create_registry();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..8u8)
            .map(|n| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let id = registry.start(owner(u32::from(n)));
                    for i in 0..200u8 {
                        registry.append_input(id, &[n, i, n]);
                    }
                    id
                })
            })
            .collect();
        let ids: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let outcome = registry.sweep(&SweepPolicy::default(), true);
        assert_eq!(outcome.to_flush.len(), ids.len());
        for detached in &outcome.to_flush {
            let n = detached.packets[0].payload[0];
            assert_eq!(u32::from(n), detached.identity.owner.owner_id);
            for (i, packet) in detached.packets.iter().enumerate() {
                assert_eq!(packet.payload.as_ref(), &[n, i as u8, n]);
            }
        }
    }

    proptest! {
        #[test]
        fn interleavings_keep_capture_order(ops in prop::collection::vec((any::<bool>(), any::<u8>()), 0..64)) {
            let (registry, clock, _) = create_registry();
            let id = registry.start(owner(1));
            for (is_input, byte) in &ops {
                clock.advance_millis(1);
                if *is_input {
                    registry.append_input(id, &[*byte]);
                } else {
                    registry.append_output(id, &[*byte]);
                }
            }

            let outcome = registry.sweep(&SweepPolicy::default(), true);
            let got: Vec<(bool, u8)> = outcome.to_flush[0]
                .packets
                .iter()
                .map(|p| (p.direction == Direction::Input, p.payload[0]))
                .collect();
            prop_assert_eq!(got, ops);
        }
    }
}
