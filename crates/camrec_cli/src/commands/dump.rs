//! Dump command implementation.

use super::{CliResult, DirectionFilter, OutputFormat};
use camrec_codec::{to_cam, CamLine};
use camrec_core::{RecordingCatalog, RecordingEntry};
use serde::Serialize;

/// One dumped packet.
#[derive(Debug, Serialize)]
pub struct DumpedPacket {
    /// Position in the recording, starting at 0.
    pub index: usize,
    /// `input` or `output`.
    pub direction: String,
    /// Milliseconds since the session started.
    pub offset_ms: i64,
    /// Payload length in bytes.
    pub len: usize,
    /// The packet as a recording line.
    pub line: String,
}

/// Selects the packets to dump.
pub fn collect(
    catalog: &RecordingCatalog,
    entry: &RecordingEntry,
    limit: Option<usize>,
    direction: Option<DirectionFilter>,
) -> CliResult<Vec<DumpedPacket>> {
    let lines = catalog.load(entry)?;
    Ok(lines
        .iter()
        .enumerate()
        .filter(|(_, line)| direction.is_none_or(|filter| filter.matches(line.direction)))
        .take(limit.unwrap_or(usize::MAX))
        .map(|(index, line)| dumped(index, line))
        .collect())
}

fn dumped(index: usize, line: &CamLine) -> DumpedPacket {
    let text = to_cam(std::slice::from_ref(line));
    DumpedPacket {
        index,
        direction: line.direction.to_string(),
        offset_ms: line.offset,
        len: line.payload.len(),
        line: text.trim_end_matches('\n').to_string(),
    }
}

/// Runs the dump command.
pub fn run(
    catalog: &RecordingCatalog,
    entry: &RecordingEntry,
    limit: Option<usize>,
    direction: Option<DirectionFilter>,
    format: OutputFormat,
) -> CliResult<()> {
    let packets = collect(catalog, entry, limit, direction)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&packets)?),
        OutputFormat::Text => {
            for packet in &packets {
                println!(
                    "{:>6} {:<6} +{:>8} ms {:>6} B  {}",
                    packet.index, packet.direction, packet.offset_ms, packet.len, packet.line
                );
            }
            println!();
            println!("{} packets shown", packets.len());
        }
    }
    Ok(())
}
