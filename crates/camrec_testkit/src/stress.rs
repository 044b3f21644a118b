//! Stress tests for camrec.
//!
//! Many producer threads capture traffic on their own sessions while the
//! sweeper flushes underneath them. Every payload carries its session and
//! sequence number so the resulting files can be checked for loss,
//! duplication and reordering.

use camrec_core::{CamLine, Direction, Recorder, RecordingCatalog, SessionOwner};
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Sessions started.
    pub sessions: usize,
    /// Packets appended.
    pub packets: usize,
    /// Total duration.
    pub duration: Duration,
    /// Packets per second.
    pub packets_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(sessions: usize, packets: usize, duration: Duration) -> Self {
        let packets_per_second = if duration.as_secs_f64() > 0.0 {
            packets as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            sessions,
            packets,
            duration,
            packets_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Sessions: {}", self.sessions);
        println!("Packets: {}", self.packets);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} packets/sec", self.packets_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of producer threads.
    pub threads: usize,
    /// Sessions each thread opens, one after another.
    pub sessions_per_thread: usize,
    /// Packets appended to each session.
    pub packets_per_session: usize,
    /// Payload length; at least 8 bytes are always written.
    pub payload_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 4,
            sessions_per_thread: 8,
            packets_per_session: 500,
            payload_size: 32,
        }
    }
}

impl StressConfig {
    /// Total sessions across all threads.
    pub fn total_sessions(&self) -> usize {
        self.threads * self.sessions_per_thread
    }
}

/// Owner id used for the `n`th session of a run. Distinct per session, so
/// no two recordings can share a file name.
pub fn stress_owner_id(session: usize) -> u32 {
    u32::try_from(session + 1).unwrap_or(u32::MAX)
}

fn stress_payload(session: usize, seq: usize, size: usize) -> Vec<u8> {
    let mut payload = Vec::with_capacity(size.max(8));
    payload.extend_from_slice(&(session as u32).to_be_bytes());
    payload.extend_from_slice(&(seq as u32).to_be_bytes());
    payload.resize(size.max(8), (seq % 251) as u8);
    payload
}

fn stress_direction(seq: usize) -> Direction {
    if seq % 2 == 0 {
        Direction::Input
    } else {
        Direction::Output
    }
}

/// Run concurrent producers against a shared recorder.
///
/// Sessions are left open; call [`Recorder::request_shutdown`] to finalize
/// them before verifying.
pub fn stress_concurrent_producers(recorder: &Recorder, config: &StressConfig) -> StressTestResult {
    let sessions = AtomicUsize::new(0);
    let packets = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let sessions = &sessions;
            let packets = &packets;
            scope.spawn(move || {
                for s in 0..config.sessions_per_thread {
                    let session = t * config.sessions_per_thread + s;
                    let owner = SessionOwner::new(
                        stress_owner_id(session),
                        1,
                        t as u32,
                        IpAddr::V4(Ipv4Addr::LOCALHOST),
                    );
                    let id = recorder.start_session(owner);
                    if id.is_disabled() {
                        continue;
                    }
                    sessions.fetch_add(1, Ordering::Relaxed);

                    for seq in 0..config.packets_per_session {
                        let payload = stress_payload(session, seq, config.payload_size);
                        match stress_direction(seq) {
                            Direction::Input => recorder.append_input(id, &payload),
                            Direction::Output => recorder.append_output(id, &payload),
                        }
                        packets.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    StressTestResult::new(
        sessions.load(Ordering::Relaxed),
        packets.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Checks finalized recordings against what the producers appended.
///
/// Returns the number of packets verified.
///
/// # Errors
///
/// Returns a description of the first discrepancy found.
pub fn verify_stress_recordings(
    catalog: &RecordingCatalog,
    config: &StressConfig,
) -> Result<usize, String> {
    let entries = catalog.entries().map_err(|e| e.to_string())?;
    if let Some(orphan) = entries.iter().find(|e| e.is_working()) {
        return Err(format!("unfinalized working file {}", orphan.file_name));
    }

    let by_owner: BTreeMap<u32, _> = entries.into_iter().map(|e| (e.name.owner_id, e)).collect();
    let mut verified = 0;

    for session in 0..config.total_sessions() {
        let owner_id = stress_owner_id(session);
        let entry = by_owner
            .get(&owner_id)
            .ok_or_else(|| format!("no recording for owner {owner_id}"))?;
        let lines = catalog.load(entry).map_err(|e| e.to_string())?;
        verify_session(session, &lines, config)
            .map_err(|msg| format!("{}: {msg}", entry.file_name))?;
        verified += lines.len();
    }

    if by_owner.len() != config.total_sessions() {
        return Err(format!(
            "expected {} recordings, found {}",
            config.total_sessions(),
            by_owner.len()
        ));
    }
    Ok(verified)
}

fn verify_session(session: usize, lines: &[CamLine], config: &StressConfig) -> Result<(), String> {
    if lines.len() != config.packets_per_session {
        return Err(format!(
            "expected {} packets, found {}",
            config.packets_per_session,
            lines.len()
        ));
    }
    let mut last_offset = i64::MIN;
    for (seq, line) in lines.iter().enumerate() {
        if line.payload != stress_payload(session, seq, config.payload_size) {
            return Err(format!("packet {seq} out of order or corrupted"));
        }
        if line.direction != stress_direction(seq) {
            return Err(format!("packet {seq} has the wrong direction"));
        }
        if line.offset < last_offset {
            return Err(format!("packet {seq} offset went backwards"));
        }
        last_offset = line.offset;
    }
    Ok(())
}
