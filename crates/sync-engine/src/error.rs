//! Sync engine error types.

use record_store_client::{RecordId, StoreError, ValidationError};
use thiserror::Error;

/// Failure of a sync engine operation.
///
/// Every variant leaves the engine usable; optimistic changes have already
/// been rolled back by the time one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// Input rejected locally; no request was made and nothing changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record service failed the request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The id is not in the authoritative set.
    #[error("Unknown record: {0}")]
    UnknownRecord(RecordId),

    /// At least one delete in a bulk delete failed; the whole batch was restored.
    #[error("Bulk delete failed for {} of {requested} records", .failures.len())]
    BulkDelete {
        requested: usize,
        failures: Vec<(RecordId, StoreError)>,
    },
}

impl SyncError {
    /// Whether the failure came from local validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

/// Result type alias using SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
