//! Best-effort facade over a snapshot backend.

use crate::store::{SnapshotDocument, SnapshotStore};
use record_store_client::Record;
use std::sync::Arc;
use tracing::{debug, warn};

/// Last known-good record set, persisted outside process memory.
///
/// Neither operation fails: write failures are logged and reported as
/// `false`, read failures (missing, corrupt, unreadable) come back as `None`.
#[derive(Clone)]
pub struct LocalSnapshot {
    store: Arc<dyn SnapshotStore>,
}

impl LocalSnapshot {
    pub fn new(store: Arc<dyn SnapshotStore>) -> Self {
        Self { store }
    }

    /// Overwrite the persisted snapshot. Returns whether it was written.
    pub fn save(&self, records: &[Record]) -> bool {
        match self.store.write(&SnapshotDocument::new(records)) {
            Ok(()) => {
                debug!(count = records.len(), "Local snapshot saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to save local snapshot");
                false
            }
        }
    }

    /// The last saved records, or `None` when there is nothing usable.
    pub fn load(&self) -> Option<Vec<Record>> {
        match self.store.read() {
            Ok(Some(document)) => {
                debug!(
                    count = document.records.len(),
                    saved_at = %document.saved_at,
                    "Local snapshot loaded"
                );
                Some(document.records)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable local snapshot");
                None
            }
        }
    }
}

impl std::fmt::Debug for LocalSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSnapshot").finish_non_exhaustive()
    }
}
