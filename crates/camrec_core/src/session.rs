//! Session and packet data.

use crate::naming::RecordingName;
use crate::types::{SessionId, SessionOwner, Timestamp};
use bytes::Bytes;
use camrec_codec::Direction;

/// One captured payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Capture time.
    pub timestamp: Timestamp,
    /// Input or output.
    pub direction: Direction,
    /// Payload, copied out of the caller's buffer at capture time.
    pub payload: Bytes,
}

/// Fixed identity of a session: everything needed to name its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Session id.
    pub id: SessionId,
    /// Owner metadata.
    pub owner: SessionOwner,
    /// Creation time; offsets in the file are relative to it.
    pub start_time: Timestamp,
}

impl SessionIdentity {
    /// Returns the name shared by the working and permanent files.
    #[must_use]
    pub fn recording_name(&self) -> RecordingName {
        RecordingName::new(self.owner.owner_id, self.start_time)
    }
}

/// A packet buffer taken out of the registry by a sweep.
///
/// Owned exclusively by the sweep result; nothing can append to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedSession {
    /// Session the packets belong to.
    pub identity: SessionIdentity,
    /// Packets in capture order.
    pub packets: Vec<Packet>,
}

impl DetachedSession {
    /// Number of detached packets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Whether no packet was detached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// A live session inside the registry.
#[derive(Debug)]
pub(crate) struct Session {
    identity: SessionIdentity,
    last_activity: Timestamp,
    buffer: Vec<Packet>,
}

impl Session {
    pub(crate) fn new(id: SessionId, owner: SessionOwner, now: Timestamp) -> Self {
        Self {
            identity: SessionIdentity {
                id,
                owner,
                start_time: now,
            },
            last_activity: now,
            buffer: Vec::new(),
        }
    }

    pub(crate) fn identity(&self) -> SessionIdentity {
        self.identity
    }

    pub(crate) fn last_activity(&self) -> Timestamp {
        self.last_activity
    }

    pub(crate) fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub(crate) fn push(&mut self, packet: Packet) {
        self.last_activity = packet.timestamp;
        self.buffer.push(packet);
    }

    /// Moves the buffer out, leaving a fresh empty one in its place.
    pub(crate) fn detach(&mut self) -> DetachedSession {
        DetachedSession {
            identity: self.identity,
            packets: std::mem::take(&mut self.buffer),
        }
    }
}
