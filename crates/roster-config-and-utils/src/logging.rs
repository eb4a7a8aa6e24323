//! Logging initialization.
//!
//! Every roster command logs through the observability crate, which appends
//! structured JSONL to `~/.roster/logs/dev.jsonl`.

use crate::{CoreResult, Paths};
use std::path::PathBuf;

/// Install the global subscriber for the `roster` binary.
///
/// `RUST_LOG` overrides `level`. Nothing is echoed to stderr, so command
/// output stays clean. Returns the log file in use.
pub fn init_logging(level: &str, paths: &Paths) -> CoreResult<PathBuf> {
    paths.ensure_dirs()?;
    let log_path = observability::init_with_config(observability::LogConfig {
        service_name: "roster".into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: false,
        ..Default::default()
    })?;
    Ok(log_path)
}
