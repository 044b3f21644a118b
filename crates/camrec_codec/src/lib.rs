//! # camrec Codec
//!
//! Encoding and decoding of `.cam` recording files.
//!
//! A recording is UTF-8 text with one line per captured packet:
//!
//! ```text
//! > 0 0a0b0c        input packet at offset 0 ms
//! < 17 ff00         output packet at offset 17 ms
//! ```
//!
//! ## Line Rules
//!
//! - Direction marker: `>` for input, `<` for output
//! - Offset: signed decimal milliseconds relative to the session start
//! - Payload: two hex digits per byte, no separators, lowercase on write
//! - Fields are separated by a single space, lines end with `\n`
//!
//! ## Usage
//!
//! ```
//! use camrec_codec::{decode_line, CamLine, Direction, LineEncoder};
//!
//! let mut encoder = LineEncoder::new();
//! encoder.push(Direction::Input, 5, &[0x0a, 0xff]);
//! assert_eq!(encoder.as_str(), "> 5 0aff\n");
//!
//! let line = decode_line("> 5 0aff").unwrap();
//! assert_eq!(line, CamLine::new(Direction::Input, 5, vec![0x0a, 0xff]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod line;

pub use decoder::{decode_line, from_cam, LineDecoder};
pub use encoder::{to_cam, LineEncoder};
pub use error::{CodecError, CodecResult};
pub use line::{CamLine, Direction};
