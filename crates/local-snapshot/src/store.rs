//! Snapshot storage backends.

use crate::error::{SnapshotError, SnapshotResult};
use chrono::{DateTime, Utc};
use record_store_client::Record;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Current on-disk format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl SnapshotDocument {
    pub fn new(records: &[Record]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            records: records.to_vec(),
        }
    }
}

/// Trait for snapshot storage backends.
pub trait SnapshotStore: Send + Sync {
    /// Replace the stored snapshot.
    fn write(&self, document: &SnapshotDocument) -> SnapshotResult<()>;

    /// Read the stored snapshot, `None` when nothing was ever written.
    fn read(&self) -> SnapshotResult<Option<SnapshotDocument>>;
}

/// JSON file backend. Writes go to a temp file that is renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn write(&self, document: &SnapshotDocument) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_vec(document)?;
        atomic_write(&self.path, &content)?;
        Ok(())
    }

    fn read(&self) -> SnapshotResult<Option<SnapshotDocument>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let document: SnapshotDocument = serde_json::from_slice(&content)?;
        if document.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(document.version));
        }
        Ok(Some(document))
    }
}

/// In-process backend, mostly for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    document: Mutex<Option<SnapshotDocument>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with `records`.
    pub fn with_records(records: &[Record]) -> Self {
        Self {
            document: Mutex::new(Some(SnapshotDocument::new(records))),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn write(&self, document: &SnapshotDocument) -> SnapshotResult<()> {
        *self.document.lock().expect("lock poisoned") = Some(document.clone());
        Ok(())
    }

    fn read(&self) -> SnapshotResult<Option<SnapshotDocument>> {
        Ok(self.document.lock().expect("lock poisoned").clone())
    }
}

fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "snapshot path has no file name"))?;

    let tmp_path = dir.join(format!(
        ".{}.roster.tmp.{}",
        file_name,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));

    let write_result = (|| -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    })();

    if let Err(err) = write_result {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    Ok(())
}
