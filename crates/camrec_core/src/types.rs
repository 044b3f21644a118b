//! Core type definitions for camrec.

use std::fmt;
use std::net::IpAddr;

/// Identifier of a recording session.
///
/// Ids are allocated monotonically starting at 1 and never reused.
/// [`SessionId::DISABLED`] (0) is handed out when recording is off; every
/// call made with it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Sentinel returned when the recorder is disabled.
    pub const DISABLED: Self = Self(0);

    /// Creates a session ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the disabled sentinel.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cam:{}", self.0)
    }
}

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns epoch milliseconds.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`; negative if `earlier` is later.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a recording belongs to.
///
/// Carried through to the working file name (`owner_id`) and log output;
/// the recorder does not interpret the other fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionOwner {
    /// Player or character id; first component of the file name.
    pub owner_id: u32,
    /// Player level at session start.
    pub owner_level: u32,
    /// Account the player belongs to.
    pub account_id: u32,
    /// Remote address of the connection.
    pub source_address: IpAddr,
}

impl SessionOwner {
    /// Creates owner metadata.
    #[must_use]
    pub const fn new(owner_id: u32, owner_level: u32, account_id: u32, source_address: IpAddr) -> Self {
        Self {
            owner_id,
            owner_level,
            account_id,
            source_address,
        }
    }
}
