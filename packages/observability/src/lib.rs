//! # Observability
//!
//! Logging setup shared by every roster binary.
//!
//! Code elsewhere only uses `tracing` macros. This crate decides where the
//! events go: one JSON object per line appended to a central file
//! (`~/.roster/logs/dev.jsonl` unless told otherwise), plus an optional
//! compact stderr stream.
//!
//! ```text
//! tail -f ~/.roster/logs/dev.jsonl | jq
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "roster".into(),
//!     default_level: "debug".into(),
//!     ..Default::default()
//! })?;
//! tracing::info!("ready");
//! ```

mod json_layer;
mod writer;

use std::io;
use std::path::PathBuf;

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{CentralLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the binary, written into every line.
    pub service_name: String,

    /// Default filter (e.g., "debug", "info", "warn").
    /// `RUST_LOG` wins when set.
    pub default_level: String,

    /// Log file path. Defaults to `~/.roster/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,

    /// Filter for the stderr stream.
    pub stderr_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            stderr_level: "warn".into(),
        }
    }
}

/// Central log file location.
///
/// Falls back to the temp directory when there is no home directory.
pub fn default_log_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".roster")
        .join("logs")
        .join("dev.jsonl")
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) -> io::Result<PathBuf> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Install the global subscriber. Returns the log file in use.
///
/// Fails if the log file cannot be opened. Calling it a second time in the
/// same process leaves the first subscriber in place.
pub fn init_with_config(config: LogConfig) -> io::Result<PathBuf> {
    writer::init_subscriber(&config)
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
