//! Recording line value types.

use std::fmt;

/// Direction of a captured packet, relative to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to server.
    Input,
    /// Server to client.
    Output,
}

impl Direction {
    /// Returns the single-character marker used in recordings.
    #[must_use]
    pub const fn marker(self) -> char {
        match self {
            Self::Input => '>',
            Self::Output => '<',
        }
    }

    /// Parses a marker character.
    #[must_use]
    pub const fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '>' => Some(Self::Input),
            '<' => Some(Self::Output),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => f.write_str("input"),
            Self::Output => f.write_str("output"),
        }
    }
}

/// One decoded recording line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CamLine {
    /// Packet direction.
    pub direction: Direction,
    /// Milliseconds since the session started.
    pub offset: i64,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl CamLine {
    /// Creates a line.
    #[must_use]
    pub fn new(direction: Direction, offset: i64, payload: Vec<u8>) -> Self {
        Self {
            direction,
            offset,
            payload,
        }
    }
}
