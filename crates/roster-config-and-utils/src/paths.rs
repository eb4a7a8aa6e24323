//! Where roster keeps its files.
//!
//! Everything lives under one directory, `~/.roster` unless `ROSTER_HOME`
//! points elsewhere:
//!
//! ```text
//! config.json
//! users-snapshot.json
//! logs/dev.jsonl
//! ```

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Overrides the base directory.
pub const HOME_ENV: &str = "ROSTER_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// `$ROSTER_HOME` when set, otherwise `~/.roster`.
    pub fn new() -> CoreResult<Self> {
        Self::resolve(std::env::var_os(HOME_ENV).map(PathBuf::from), dirs::home_dir())
    }

    fn resolve(override_dir: Option<PathBuf>, home: Option<PathBuf>) -> CoreResult<Self> {
        if let Some(dir) = override_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            return Ok(Self::with_base_dir(dir));
        }
        let home = home.ok_or_else(|| {
            CoreError::Path(format!("no home directory and {HOME_ENV} is not set"))
        })?;
        Ok(Self::with_base_dir(home.join(".roster")))
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Last record set fetched from the service.
    pub fn snapshot_file(&self) -> PathBuf {
        self.base_dir.join("users-snapshot.json")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("dev.jsonl")
    }

    /// Create the base and log directories if missing.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
