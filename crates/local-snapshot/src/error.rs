//! Snapshot storage errors.

use thiserror::Error;

/// Failure of a snapshot backend. Never fatal to callers of `LocalSnapshot`.
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by an incompatible version.
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    /// The backend refused the write (quota, read-only medium, ...).
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias using SnapshotError.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
