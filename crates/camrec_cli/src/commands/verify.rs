//! Verify command implementation.

use super::{CliError, CliResult, OutputFormat};
use camrec_codec::LineDecoder;
use camrec_core::{RecordingCatalog, RecordingEntry};
use serde::Serialize;
use tracing::debug;

/// Verification result.
#[derive(Debug, Default, Serialize)]
pub struct VerifyResult {
    /// Recordings checked.
    pub files_checked: usize,
    /// Recordings that decoded cleanly.
    pub valid_files: usize,
    /// Recordings with at least one malformed line.
    pub corrupt_files: usize,
    /// Recordings renamed away before they could be read.
    pub skipped_files: usize,
    /// Packet lines decoded.
    pub lines_checked: usize,
    /// One message per malformed line.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.corrupt_files == 0 && self.errors.is_empty()
    }
}

/// Decodes every recording in the catalog.
///
/// Files renamed away between listing and reading are counted as skipped.
pub fn collect(catalog: &RecordingCatalog) -> CliResult<VerifyResult> {
    let mut result = VerifyResult::default();
    for entry in catalog.entries()? {
        let bytes = match catalog.raw(&entry) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                debug!(file = %entry.file_name, "skipped, file moved");
                result.skipped_files += 1;
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        result.files_checked += 1;
        let errors_before = result.errors.len();
        verify_file(&entry, &bytes, &mut result);
        if result.errors.len() == errors_before {
            result.valid_files += 1;
        } else {
            result.corrupt_files += 1;
        }
    }
    Ok(result)
}

fn verify_file(entry: &RecordingEntry, bytes: &[u8], result: &mut VerifyResult) {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            result
                .errors
                .push(format!("{}: not UTF-8 text: {err}", entry.file_name));
            return;
        }
    };

    // Keep decoding past a bad line to report every one of them
    for decoded in LineDecoder::new(text) {
        match decoded {
            Ok(_) => result.lines_checked += 1,
            Err(err) => result.errors.push(format!("{}: {err}", entry.file_name)),
        }
    }
    debug!(file = %entry.file_name, "verified");
}

/// Runs the verify command.
pub fn run(catalog: &RecordingCatalog, format: OutputFormat) -> CliResult<()> {
    let result = collect(catalog)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text_output(&result),
    }

    if result.is_ok() {
        Ok(())
    } else {
        Err(CliError::VerificationFailed {
            corrupt: result.corrupt_files,
            checked: result.files_checked,
        })
    }
}

fn print_text_output(result: &VerifyResult) {
    println!("Recordings checked: {}", result.files_checked);
    println!("  Valid:   {}", result.valid_files);
    println!("  Corrupt: {}", result.corrupt_files);
    if result.skipped_files > 0 {
        println!("  Skipped: {} (moved while verifying)", result.skipped_files);
    }
    println!("Lines decoded:      {}", result.lines_checked);

    if !result.errors.is_empty() {
        println!();
        println!("Errors:");
        for error in &result.errors {
            println!("  - {error}");
        }
    }

    println!();
    if result.is_ok() {
        println!("✓ Recording verification passed");
    } else {
        println!("✗ Recording verification failed");
    }
}
