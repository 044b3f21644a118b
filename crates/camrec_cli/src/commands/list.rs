//! List command implementation.

use super::{format_size, kind_label, CliResult, OutputFormat};
use camrec_core::{RecordingCatalog, RecordingSummary};
use serde::Serialize;
use tracing::debug;

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct ListedRecording {
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
    /// Packet lines, if the file decodes.
    pub lines: Option<usize>,
    /// Decode error, if it does not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Collects the listing.
///
/// Files renamed away between listing and reading, such as a working file
/// the recorder just finalized, are left out.
pub fn collect(catalog: &RecordingCatalog, working_only: bool) -> CliResult<Vec<ListedRecording>> {
    let mut rows = Vec::new();
    for entry in catalog.entries()? {
        if working_only && !entry.is_working() {
            continue;
        }
        let bytes = match catalog.raw(&entry) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                debug!(file = %entry.file_name, "skipped, file moved");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        let size_bytes = bytes.len() as u64;
        let (lines, error) = match RecordingSummary::decode(&bytes) {
            Ok(summary) => (Some(summary.packets), None),
            Err(err) => (None, Some(err.to_string())),
        };
        rows.push(ListedRecording {
            owner_id: entry.name.owner_id,
            start_time: entry.name.start_time.as_millis(),
            kind: kind_label(&entry),
            file: entry.file_name,
            size_bytes,
            lines,
            error,
        });
    }
    Ok(rows)
}

/// Runs the list command.
pub fn run(catalog: &RecordingCatalog, working_only: bool, format: OutputFormat) -> CliResult<()> {
    let rows = collect(catalog, working_only)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => print_text_output(&rows),
    }
    Ok(())
}

fn print_text_output(rows: &[ListedRecording]) {
    if rows.is_empty() {
        println!("No recordings found");
        return;
    }
    println!(
        "{:<32} {:>10} {:>15} {:<9} {:>8} {:>10}",
        "FILE", "OWNER", "START", "KIND", "LINES", "SIZE"
    );
    for row in rows {
        let lines = row
            .lines
            .map_or_else(|| "corrupt".to_string(), |n| n.to_string());
        println!(
            "{:<32} {:>10} {:>15} {:<9} {:>8} {:>10}",
            row.file,
            row.owner_id,
            row.start_time,
            row.kind,
            lines,
            format_size(row.size_bytes)
        );
    }
    println!();
    println!("{} recordings", rows.len());
}
