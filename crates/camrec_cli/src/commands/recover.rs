//! Recover command implementation.

use super::{CliError, CliResult};
use camrec_core::{CoreError, RecordingCatalog};
use tracing::warn;

/// Outcome for the working files found.
#[derive(Debug, Default)]
pub struct RecoverResult {
    /// `(working, permanent)` pairs renamed, or that would be with `--dry-run`.
    pub recovered: Vec<(String, String)>,
    /// Working files left alone because the permanent file exists.
    pub conflicts: Vec<String>,
}

/// Finalizes every orphaned working file.
pub fn collect(catalog: &RecordingCatalog, dry_run: bool) -> CliResult<RecoverResult> {
    let mut result = RecoverResult::default();
    for orphan in catalog.orphans()? {
        match catalog.recover(&orphan, dry_run) {
            Ok(target) => result.recovered.push((orphan.file_name, target)),
            Err(CoreError::AlreadyFinalized { name }) => {
                warn!(working = %orphan.file_name, permanent = %name, "permanent recording exists; not overwriting");
                result.conflicts.push(orphan.file_name);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(result)
}

/// Runs the recover command.
pub fn run(catalog: &RecordingCatalog, dry_run: bool) -> CliResult<()> {
    let result = collect(catalog, dry_run)?;

    let verb = if dry_run { "Would rename" } else { "Renamed" };
    for (from, to) in &result.recovered {
        println!("{verb} {from} -> {to}");
    }
    for file in &result.conflicts {
        println!("Skipped {file}: permanent file already exists");
    }
    if result.recovered.is_empty() && result.conflicts.is_empty() {
        println!("No orphaned working files");
    }

    if result.conflicts.is_empty() {
        Ok(())
    } else {
        Err(CliError::RecoveryIncomplete {
            count: result.conflicts.len(),
        })
    }
}
