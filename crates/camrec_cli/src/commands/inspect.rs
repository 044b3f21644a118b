//! Inspect command implementation.

use super::{format_size, kind_label, CliResult, OutputFormat};
use camrec_core::{RecordingCatalog, RecordingEntry};
use serde::Serialize;

/// Recording inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// File name.
    pub file: String,
    /// Owner id from the file name.
    pub owner_id: u32,
    /// Session start, epoch milliseconds.
    pub start_time: i64,
    /// `permanent` or `working`.
    pub kind: &'static str,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Total packets.
    pub packets: usize,
    /// Input packets.
    pub input_packets: usize,
    /// Output packets.
    pub output_packets: usize,
    /// Input payload bytes.
    pub input_bytes: u64,
    /// Output payload bytes.
    pub output_bytes: u64,
    /// Offset of the first packet.
    pub first_offset_ms: Option<i64>,
    /// Offset of the last packet.
    pub duration_ms: i64,
}

/// Summarizes one recording.
pub fn collect(catalog: &RecordingCatalog, entry: &RecordingEntry) -> CliResult<InspectResult> {
    let summary = catalog.summarize(entry)?;
    Ok(InspectResult {
        file: entry.file_name.clone(),
        owner_id: entry.name.owner_id,
        start_time: entry.name.start_time.as_millis(),
        kind: kind_label(entry),
        size_bytes: summary.size_bytes,
        packets: summary.packets,
        input_packets: summary.input_packets,
        output_packets: summary.output_packets,
        input_bytes: summary.input_bytes,
        output_bytes: summary.output_bytes,
        first_offset_ms: summary.first_offset,
        duration_ms: summary.duration_ms(),
    })
}

/// Runs the inspect command.
pub fn run(catalog: &RecordingCatalog, entry: &RecordingEntry, format: OutputFormat) -> CliResult<()> {
    let result = collect(catalog, entry)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }
    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("Recording {}", result.file);
    println!("=========={}", "=".repeat(result.file.len()));
    println!();
    println!("Owner:      {}", result.owner_id);
    println!("Started:    {} ms", result.start_time);
    println!("Kind:       {}", result.kind);
    println!("Size:       {}", format_size(result.size_bytes));
    println!("Duration:   {} ms", result.duration_ms);
    println!();
    println!("Packets:");
    println!(
        "  Input:  {:>8} packets, {}",
        result.input_packets,
        format_size(result.input_bytes)
    );
    println!(
        "  Output: {:>8} packets, {}",
        result.output_packets,
        format_size(result.output_bytes)
    );
    println!("  Total:  {:>8} packets", result.packets);
}
