//! Working file finalization.

use crate::error::{CoreError, CoreResult};
use crate::session::SessionIdentity;
use crate::stats::RecorderStats;
use camrec_storage::RecordingStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Renames closed sessions' working files to their permanent names.
///
/// A failed rename is logged and left alone: the working file stays in the
/// directory, where `camrec recover` can finalize it later.
pub struct Finalizer {
    store: Arc<dyn RecordingStore>,
    stats: Arc<RecorderStats>,
}

impl Finalizer {
    /// Creates a finalizer over a store.
    pub fn new(store: Arc<dyn RecordingStore>, stats: Arc<RecorderStats>) -> Self {
        Self { store, stats }
    }

    /// Renames one working file to its permanent name.
    ///
    /// An existing permanent file is never replaced.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyFinalized`] if the permanent name is
    /// taken, or the storage error if the rename fails.
    pub fn finalize(&self, identity: &SessionIdentity) -> CoreResult<()> {
        let name = identity.recording_name();
        let permanent = name.permanent_file_name();
        if self.store.exists(&permanent)? {
            return Err(CoreError::already_finalized(permanent));
        }
        self.store.rename(&name.working_file_name(), &permanent)?;
        Ok(())
    }

    /// Finalizes every closed session, logging and skipping failures.
    ///
    /// Returns the number of files finalized.
    pub fn finalize_all(&self, identities: &[SessionIdentity]) -> usize {
        let mut finalized = 0;
        for identity in identities {
            let name = identity.recording_name();
            match self.finalize(identity) {
                Ok(()) => {
                    self.stats.record_rename();
                    finalized += 1;
                    debug!(
                        session = %identity.id,
                        owner_id = identity.owner.owner_id,
                        owner_level = identity.owner.owner_level,
                        account_id = identity.owner.account_id,
                        address = %identity.owner.source_address,
                        file = %name.permanent_file_name(),
                        "recording finalized"
                    );
                }
                Err(e) => {
                    self.stats.record_rename_failure();
                    warn!(
                        session = %identity.id,
                        from = %name.working_file_name(),
                        to = %name.permanent_file_name(),
                        error = %e,
                        "failed to move working file to its permanent name"
                    );
                }
            }
        }
        finalized
    }
}

impl std::fmt::Debug for Finalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Finalizer").finish_non_exhaustive()
    }
}
