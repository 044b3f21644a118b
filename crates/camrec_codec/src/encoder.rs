//! Recording line encoder.

use crate::line::{CamLine, Direction};
use std::fmt::Write;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encode lines into recording text.
pub fn to_cam(lines: &[CamLine]) -> String {
    let mut encoder = LineEncoder::new();
    for line in lines {
        encoder.push(line.direction, line.offset, &line.payload);
    }
    encoder.into_string()
}

/// Accumulates recording lines into one text buffer.
///
/// The recorder renders a whole detached buffer with one encoder and hands
/// the result to the store in a single append.
#[derive(Debug, Default)]
pub struct LineEncoder {
    buffer: String,
    lines: usize,
}

impl LineEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new encoder with the specified byte capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: String::with_capacity(capacity),
            lines: 0,
        }
    }

    /// Append one line.
    pub fn push(&mut self, direction: Direction, offset: i64, payload: &[u8]) {
        self.buffer.reserve(payload.len() * 2 + 24);
        self.buffer.push(direction.marker());
        self.buffer.push(' ');
        // Writing into a String cannot fail
        let _ = write!(self.buffer, "{offset}");
        self.buffer.push(' ');
        for byte in payload {
            self.buffer.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
            self.buffer.push(HEX_DIGITS[usize::from(byte & 0x0f)] as char);
        }
        self.buffer.push('\n');
        self.lines += 1;
    }

    /// Number of lines written so far.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Whether no line has been written.
    pub fn is_empty(&self) -> bool {
        self.lines == 0
    }

    /// Get the encoded text.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Get the encoded text as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Consume this encoder and return the encoded text.
    pub fn into_string(self) -> String {
        self.buffer
    }
}
