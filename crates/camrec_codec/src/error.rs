//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding recordings.
///
/// Line numbers are 1-based; a bare [`decode_line`](crate::decode_line)
/// call reports line 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The recording is not valid UTF-8.
    #[error("line {line}: invalid UTF-8")]
    InvalidUtf8 {
        /// Line where decoding stopped.
        line: usize,
    },

    /// The line does not have the `DIR OFFSET HEX` shape.
    #[error("line {line}: malformed line: {message}")]
    MalformedLine {
        /// Offending line.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// The direction marker is neither `<` nor `>`.
    #[error("line {line}: unknown direction marker {marker:?}")]
    UnknownDirection {
        /// Offending line.
        line: usize,
        /// The marker found.
        marker: String,
    },

    /// The offset is not a signed decimal integer.
    #[error("line {line}: invalid offset {value:?}")]
    InvalidOffset {
        /// Offending line.
        line: usize,
        /// The text found.
        value: String,
    },

    /// The payload is not an even-length hex string.
    #[error("line {line}: invalid hex payload at column {column}")]
    InvalidHex {
        /// Offending line.
        line: usize,
        /// Zero-based position within the hex field.
        column: usize,
    },
}

impl CodecError {
    /// Creates a malformed line error.
    pub fn malformed(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedLine {
            line,
            message: message.into(),
        }
    }

    /// Returns the line number the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::InvalidUtf8 { line }
            | Self::MalformedLine { line, .. }
            | Self::UnknownDirection { line, .. }
            | Self::InvalidOffset { line, .. }
            | Self::InvalidHex { line, .. } => *line,
        }
    }

    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Self::InvalidUtf8 { .. } => Self::InvalidUtf8 { line },
            Self::MalformedLine { message, .. } => Self::MalformedLine { line, message },
            Self::UnknownDirection { marker, .. } => Self::UnknownDirection { line, marker },
            Self::InvalidOffset { value, .. } => Self::InvalidOffset { line, value },
            Self::InvalidHex { column, .. } => Self::InvalidHex { line, column },
        }
    }
}
