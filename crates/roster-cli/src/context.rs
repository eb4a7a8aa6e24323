//! Builds a loaded engine for a single command.

use crate::output::{self, OutputFormat};
use anyhow::{Context as _, Result};
use local_snapshot::{FileSnapshotStore, LocalSnapshot};
use record_store_client::HttpRecordStore;
use roster_config_and_utils::{Config, Paths};
use std::sync::Arc;
use std::time::Duration;
use sync_engine::{EngineConfig, SyncEngine};
use tracing::{debug, info};

/// Shown when records come from the local snapshot.
pub const OFFLINE_BANNER: &str =
    "Offline: the record service is unreachable, showing the last saved records.";

/// Everything a command needs: the loaded engine and how to print.
pub struct Context {
    pub engine: Arc<SyncEngine>,
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    /// Build the engine from `config` and load the record set.
    ///
    /// Fails only when neither the service nor the snapshot has records.
    pub async fn open(config: Config, paths: &Paths, format: OutputFormat) -> Result<Self> {
        let api_url = config.api_url().context("Invalid api_url")?;
        let store = HttpRecordStore::with_timeout(
            api_url.as_str(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        let snapshot = LocalSnapshot::new(Arc::new(FileSnapshotStore::new(paths.snapshot_file())));
        let engine = SyncEngine::new(Arc::new(store), snapshot, engine_config(&config));

        debug!(api_url = %api_url, "Loading records");
        let status = engine.initialize().await;
        if let Some(e) = status.load_error() {
            anyhow::bail!("Could not load records: {e}");
        }
        if status.is_degraded() {
            info!("Running from local snapshot");
            output::print_notice(OFFLINE_BANNER, &format);
        }

        Ok(Self {
            engine: Arc::new(engine),
            config,
            format,
        })
    }
}

fn engine_config(config: &Config) -> EngineConfig {
    let undo_secs = i64::try_from(config.undo_window_secs).unwrap_or(i64::MAX);
    EngineConfig {
        undo_window: chrono::Duration::try_seconds(undo_secs).unwrap_or(chrono::Duration::MAX),
        ..EngineConfig::default()
    }
}
