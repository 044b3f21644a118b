//! Recording line decoder.

use crate::error::{CodecError, CodecResult};
use crate::line::{CamLine, Direction};

/// Decode a whole recording.
///
/// Blank lines are skipped.
///
/// # Errors
///
/// Returns the first decoding error, tagged with its line number.
pub fn from_cam(bytes: &[u8]) -> CodecResult<Vec<CamLine>> {
    let text = std::str::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8 {
        line: bytes[..e.valid_up_to()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1,
    })?;
    LineDecoder::new(text).map(|r| r.map(|(_, line)| line)).collect()
}

/// Decode a single line without its trailing newline.
///
/// # Errors
///
/// Returns an error reporting line 1 if the line is malformed.
pub fn decode_line(text: &str) -> CodecResult<CamLine> {
    let text = text.strip_suffix('\r').unwrap_or(text);
    let mut fields = text.splitn(3, ' ');

    let marker = fields.next().unwrap_or_default();
    let direction = match marker.parse::<char>().ok().and_then(Direction::from_marker) {
        Some(direction) => direction,
        None => {
            return Err(CodecError::UnknownDirection {
                line: 1,
                marker: marker.to_string(),
            })
        }
    };

    let offset_text = fields
        .next()
        .ok_or_else(|| CodecError::malformed(1, "missing offset"))?;
    let offset = offset_text
        .parse::<i64>()
        .map_err(|_| CodecError::InvalidOffset {
            line: 1,
            value: offset_text.to_string(),
        })?;

    // A line for an empty payload may lose its trailing space
    let payload = decode_hex(fields.next().unwrap_or_default())?;

    Ok(CamLine::new(direction, offset, payload))
}

fn decode_hex(hex: &str) -> CodecResult<Vec<u8>> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(CodecError::InvalidHex {
            line: 1,
            column: bytes.len() - 1,
        });
    }

    let mut payload = Vec::with_capacity(bytes.len() / 2);
    for (i, pair) in bytes.chunks_exact(2).enumerate() {
        let high = nibble(pair[0]).ok_or(CodecError::InvalidHex {
            line: 1,
            column: i * 2,
        })?;
        let low = nibble(pair[1]).ok_or(CodecError::InvalidHex {
            line: 1,
            column: i * 2 + 1,
        })?;
        payload.push((high << 4) | low);
    }
    Ok(payload)
}

const fn nibble(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// A streaming decoder over recording text.
///
/// Yields `(line_number, line)` pairs; line numbers are 1-based and count
/// skipped blank lines.
pub struct LineDecoder<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> LineDecoder<'a> {
    /// Create a new decoder for the given text.
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().enumerate(),
        }
    }
}

impl Iterator for LineDecoder<'_> {
    type Item = CodecResult<(usize, CamLine)>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, text) in self.lines.by_ref() {
            if text.trim().is_empty() {
                continue;
            }
            let number = index + 1;
            return Some(
                decode_line(text)
                    .map(|line| (number, line))
                    .map_err(|e| e.at_line(number)),
            );
        }
        None
    }
}
