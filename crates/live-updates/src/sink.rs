//! Destination for pushed record sets.

use record_store_client::Record;
use sync_engine::SyncEngine;

/// Receives every well-formed record set the channel gets.
pub trait ExternalUpdateSink: Send + Sync {
    fn apply_external_update(&self, records: Vec<Record>);
}

impl ExternalUpdateSink for SyncEngine {
    fn apply_external_update(&self, records: Vec<Record>) {
        SyncEngine::apply_external_update(self, records);
    }
}
