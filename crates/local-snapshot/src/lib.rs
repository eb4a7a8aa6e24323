//! Persistent best-effort cache of the last known-good record set.
//!
//! - [`LocalSnapshot`]: the facade the sync engine uses; never fails
//! - [`SnapshotStore`]: backend trait
//! - [`FileSnapshotStore`]: versioned JSON file, atomic replace
//! - [`MemorySnapshotStore`]: in-process backend

mod error;
mod snapshot;
mod store;

pub use error::{SnapshotError, SnapshotResult};
pub use snapshot::LocalSnapshot;
pub use store::{
    FileSnapshotStore, MemorySnapshotStore, SnapshotDocument, SnapshotStore, SNAPSHOT_VERSION,
};
