//! Optimistic synchronization of the authoritative record set.

use crate::clock::{Clock, SystemClock};
use crate::error::{SyncError, SyncResult};
use crate::pending::{MutationKind, MutationSeq, PendingLedger, PendingMutation};
use crate::state::{EngineEvent, EngineStatus, ReadyState};
use crate::undo::{UndoManager, UndoToken, DEFAULT_UNDO_WINDOW_SECS};
use chrono::Duration;
use futures_util::future::join_all;
use local_snapshot::LocalSnapshot;
use record_store_client::{
    Record, RecordFields, RecordId, RecordPatch, RecordStore, StoreError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// The authoritative record set, ordered by id.
pub type RecordSet = BTreeMap<RecordId, Record>;

const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a deleted record stays restorable.
    pub undo_window: Duration,
    /// Buffer size of the event channel. Slow subscribers lag, they never block.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            undo_window: Duration::seconds(DEFAULT_UNDO_WINDOW_SECS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

struct EngineInner {
    status: EngineStatus,
    records: RecordSet,
    /// Whether `records` has ever been populated from the service, the
    /// snapshot, or a push.
    loaded: bool,
    pending: PendingLedger,
    undo: UndoManager,
}

impl EngineInner {
    /// Revert every record `mutation` touched.
    ///
    /// When a later mutation still in flight touches the same record, the
    /// visible value belongs to it: the pre-image is handed to that mutation
    /// instead of being written back. A record that was deleted meanwhile
    /// stays deleted, and its undo entry takes the pre-image instead.
    fn roll_back(&mut self, mutation: PendingMutation) {
        let PendingMutation { seq, before, .. } = mutation;
        for (id, record) in before {
            match self.pending.next_touching(seq, id) {
                Some(later) => {
                    debug!(record_id = id, seq, later = later.seq, "Handing pre-image to later mutation");
                    if later.kind == MutationKind::Delete {
                        self.undo.refresh(id, record.clone());
                    }
                    later.before.insert(id, record);
                }
                None if !self.records.contains_key(&id) && self.undo.refresh(id, record.clone()) => {
                    debug!(record_id = id, seq, "Record deleted meanwhile, pre-image kept for undo");
                }
                None => {
                    self.records.insert(id, record);
                }
            }
        }
    }

    /// Write a server-confirmed record, unless a later mutation owns it.
    fn confirm(&mut self, seq: MutationSeq, canonical: Record) {
        let id = canonical.id;
        match self.pending.next_touching(seq, id) {
            Some(later) => {
                if later.kind == MutationKind::Delete {
                    self.undo.refresh(id, canonical.clone());
                }
                later.before.insert(id, canonical);
            }
            None => match self.records.get_mut(&id) {
                Some(slot) => *slot = canonical,
                None => {
                    self.undo.refresh(id, canonical);
                }
            },
        }
    }
}

/// Client-side view of the record service.
///
/// Updates and deletes are applied locally before the request goes out and
/// rolled back if it fails; creates wait for the server-assigned id. All
/// state sits behind one mutex that is never held across a request, so any
/// number of mutations can be in flight at once.
pub struct SyncEngine {
    store: Arc<dyn RecordStore>,
    snapshot: LocalSnapshot,
    clock: Arc<dyn Clock>,
    inner: Mutex<EngineInner>,
    events: broadcast::Sender<EngineEvent>,
}

impl SyncEngine {
    pub fn new(store: Arc<dyn RecordStore>, snapshot: LocalSnapshot, config: EngineConfig) -> Self {
        Self::with_clock(store, snapshot, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        snapshot: LocalSnapshot,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let inner = EngineInner {
            status: EngineStatus::Uninitialized,
            records: RecordSet::new(),
            loaded: false,
            pending: PendingLedger::default(),
            undo: UndoManager::new(config.undo_window, clock.clone()),
        };
        Self {
            store,
            snapshot,
            clock,
            inner: Mutex::new(inner),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        self.inner.lock().expect("lock poisoned")
    }

    fn emit(&self, event: EngineEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn set_status(&self, inner: &mut EngineInner, status: EngineStatus) {
        inner.status = status.clone();
        self.emit(EngineEvent::StatusChanged(status));
    }

    // ========================================================================
    // Observation
    // ========================================================================

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> EngineStatus {
        self.lock().status.clone()
    }

    /// All records in id order.
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.values().cloned().collect()
    }

    /// Copy of the authoritative set.
    pub fn record_set(&self) -> RecordSet {
        self.lock().records.clone()
    }

    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.lock().records.get(&id).cloned()
    }

    /// Creates sent but not yet answered.
    pub fn pending_creates(&self) -> usize {
        self.lock().pending.count(MutationKind::Create)
    }

    /// Mutations of any kind sent but not yet answered.
    pub fn pending_mutations(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_undo_live(&self, token: &UndoToken) -> bool {
        self.lock().undo.is_live(token)
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the full set from the service.
    ///
    /// On success the set is replaced and written to the local snapshot. On
    /// failure an already loaded set is kept; otherwise the snapshot is
    /// used; only when both are missing does the engine end in
    /// `Ready` with a blocking error. Calling this again is the retry path.
    pub async fn initialize(&self) -> EngineStatus {
        {
            let mut inner = self.lock();
            self.set_status(&mut inner, EngineStatus::Loading);
        }
        info!("Loading records");

        let status = match self.store.list().await {
            Ok(records) => {
                let count = records.len();
                let saved: Vec<Record> = {
                    let mut inner = self.lock();
                    inner.records = index(records);
                    inner.loaded = true;
                    inner.records.values().cloned().collect()
                };
                self.snapshot.save(&saved);
                info!(count, "Records loaded");
                EngineStatus::Ready(ReadyState::online())
            }
            Err(error) => self.fall_back(error),
        };

        let mut inner = self.lock();
        self.emit(EngineEvent::RecordsChanged);
        self.set_status(&mut inner, status.clone());
        status
    }

    fn fall_back(&self, error: StoreError) -> EngineStatus {
        let already_loaded = self.lock().loaded;
        if already_loaded {
            warn!(error = %error, "Reload failed, keeping current records");
            return EngineStatus::Ready(ReadyState::degraded());
        }

        match self.snapshot.load() {
            Some(records) => {
                warn!(
                    error = %error,
                    count = records.len(),
                    "Service unreachable, serving local snapshot"
                );
                let mut inner = self.lock();
                inner.records = index(records);
                inner.loaded = true;
                EngineStatus::Ready(ReadyState::degraded())
            }
            None => {
                error!(error = %error, "Failed to load records and no local snapshot");
                EngineStatus::Ready(ReadyState::failed(error))
            }
        }
    }

    /// Re-fetch one record. A 404 removes it locally.
    pub async fn refresh_record(&self, id: RecordId) -> SyncResult<Option<Record>> {
        match self.store.get(id).await {
            Ok(record) => {
                let mut inner = self.lock();
                inner.records.insert(id, record.clone());
                self.emit(EngineEvent::RecordsChanged);
                Ok(Some(record))
            }
            Err(e) if e.is_not_found() => {
                let mut inner = self.lock();
                if inner.records.remove(&id).is_some() {
                    debug!(record_id = id, "Record gone on the service, removed locally");
                    self.emit(EngineEvent::RecordsChanged);
                }
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the set wholesale with a pushed snapshot.
    ///
    /// Last writer wins: pending mutations are left alone, and a later
    /// rollback may still write its pre-image over the pushed value.
    pub fn apply_external_update(&self, records: Vec<Record>) {
        let count = records.len();
        let mut inner = self.lock();
        inner.records = index(records);
        inner.loaded = true;
        if inner.status.load_error().is_some() {
            self.set_status(&mut inner, EngineStatus::Ready(ReadyState::online()));
        }
        self.emit(EngineEvent::ExternalUpdateApplied { count });
        self.emit(EngineEvent::RecordsChanged);
        info!(count, "Applied pushed record set");
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a record. Not optimistic: it appears once the service answers
    /// with its id.
    pub async fn create(&self, fields: RecordFields) -> SyncResult<Record> {
        fields.validate()?;
        let seq = {
            let mut inner = self.lock();
            inner
                .pending
                .register(MutationKind::Create, BTreeMap::new(), self.clock.now())
        };

        let result = self.store.create(&fields).await;

        let mut inner = self.lock();
        inner.pending.take(seq);
        match result {
            Ok(record) => {
                info!(record_id = record.id, "Record created");
                inner.records.insert(record.id, record.clone());
                self.emit(EngineEvent::RecordsChanged);
                Ok(record)
            }
            Err(error) => {
                warn!(error = %error, "Create failed");
                self.emit(EngineEvent::MutationFailed {
                    kind: MutationKind::Create,
                    record_ids: Vec::new(),
                    error: error.clone(),
                });
                Err(error.into())
            }
        }
    }

    /// Apply `patch` locally, then send the full field set.
    ///
    /// Validation runs against the patched record before anything changes.
    /// On failure the previous value comes back.
    pub async fn update(&self, id: RecordId, patch: RecordPatch) -> SyncResult<Record> {
        let (seq, fields, optimistic) = {
            let mut inner = self.lock();
            let current = inner
                .records
                .get(&id)
                .cloned()
                .ok_or(SyncError::UnknownRecord(id))?;
            let fields = patch.apply_to(&current);
            fields.validate()?;

            let optimistic = current.with_fields(&fields);
            inner.records.insert(id, optimistic.clone());
            let seq = inner.pending.register(
                MutationKind::Update,
                BTreeMap::from([(id, current)]),
                self.clock.now(),
            );
            self.emit(EngineEvent::RecordsChanged);
            (seq, fields, optimistic)
        };
        debug!(record_id = id, seq, "Update applied locally");

        let result = self.store.update(id, &fields).await;

        let mut inner = self.lock();
        let mutation = inner.pending.take(seq);
        match result {
            Ok(Some(canonical)) => {
                inner.confirm(seq, canonical.clone());
                self.emit(EngineEvent::RecordsChanged);
                Ok(canonical)
            }
            Ok(None) => Ok(optimistic),
            Err(error) => {
                warn!(record_id = id, error = %error, "Update failed, rolling back");
                if let Some(mutation) = mutation {
                    inner.roll_back(mutation);
                }
                self.emit(EngineEvent::MutationFailed {
                    kind: MutationKind::Update,
                    record_ids: vec![id],
                    error: error.clone(),
                });
                self.emit(EngineEvent::RecordsChanged);
                Err(error.into())
            }
        }
    }

    /// Remove a record locally, keep it restorable, then delete it remotely.
    ///
    /// A 404 counts as success. On any other failure the record is restored
    /// and the undo token stops working.
    pub async fn delete(&self, id: RecordId) -> SyncResult<UndoToken> {
        let (seq, token) = {
            let mut inner = self.lock();
            let record = inner
                .records
                .remove(&id)
                .ok_or(SyncError::UnknownRecord(id))?;
            let token = inner.undo.capture_for_undo(record.clone());
            let seq = inner.pending.register(
                MutationKind::Delete,
                BTreeMap::from([(id, record)]),
                self.clock.now(),
            );
            self.emit(EngineEvent::RecordsChanged);
            (seq, token)
        };

        let result = self.store.delete(id).await;

        let mut inner = self.lock();
        let mutation = inner.pending.take(seq);
        match result {
            Ok(()) => {
                info!(record_id = id, "Record deleted");
                Ok(token)
            }
            Err(error) if error.is_not_found() => {
                debug!(record_id = id, "Record already gone on the service");
                Ok(token)
            }
            Err(error) => {
                warn!(record_id = id, error = %error, "Delete failed, restoring record");
                inner.undo.invalidate(&token);
                if let Some(mutation) = mutation {
                    inner.roll_back(mutation);
                }
                self.emit(EngineEvent::MutationFailed {
                    kind: MutationKind::Delete,
                    record_ids: vec![id],
                    error: error.clone(),
                });
                self.emit(EngineEvent::RecordsChanged);
                Err(error.into())
            }
        }
    }

    /// Delete several records at once, all or nothing.
    ///
    /// Every delete is issued concurrently. If any fails (404 aside), every
    /// record of the batch is restored locally, including ones the service
    /// did remove. Returns how many distinct ids were requested, whether or
    /// not each one was cached locally.
    pub async fn bulk_delete(&self, ids: &[RecordId]) -> SyncResult<usize> {
        let ids: BTreeSet<RecordId> = ids.iter().copied().collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let (seq, removed) = {
            let mut inner = self.lock();
            let before: BTreeMap<RecordId, Record> = ids
                .iter()
                .filter_map(|id| inner.records.remove(id).map(|record| (*id, record)))
                .collect();
            let removed = before.len();
            let seq = inner
                .pending
                .register(MutationKind::BulkDelete, before, self.clock.now());
            self.emit(EngineEvent::RecordsChanged);
            (seq, removed)
        };
        debug!(requested = ids.len(), removed, seq, "Bulk delete applied locally");

        let store = &self.store;
        let results = join_all(
            ids.iter()
                .map(|&id| async move { (id, store.delete(id).await) }),
        )
        .await;
        let failures: Vec<(RecordId, StoreError)> = results
            .into_iter()
            .filter_map(|(id, result)| match result {
                Err(error) if !error.is_not_found() => Some((id, error)),
                _ => None,
            })
            .collect();

        let mut inner = self.lock();
        let mutation = inner.pending.take(seq);
        if failures.is_empty() {
            info!(requested = ids.len(), removed, "Bulk delete confirmed");
            return Ok(ids.len());
        }

        warn!(
            requested = ids.len(),
            failed = failures.len(),
            "Bulk delete failed, restoring batch"
        );
        if let Some(mutation) = mutation {
            inner.roll_back(mutation);
        }
        self.emit(EngineEvent::MutationFailed {
            kind: MutationKind::BulkDelete,
            record_ids: ids.iter().copied().collect(),
            error: failures[0].1.clone(),
        });
        self.emit(EngineEvent::RecordsChanged);
        Err(SyncError::BulkDelete {
            requested: ids.len(),
            failures,
        })
    }

    // ========================================================================
    // Undo
    // ========================================================================

    /// Put a deleted record back. Local only: no request is sent.
    ///
    /// Returns `false` when the token expired or was already used.
    pub fn undo_delete(&self, token: &UndoToken) -> bool {
        let mut inner = self.lock();
        match inner.undo.redo(token) {
            Some(record) => {
                info!(record_id = record.id, "Delete undone");
                inner.records.insert(record.id, record);
                self.emit(EngineEvent::RecordsChanged);
                true
            }
            None => false,
        }
    }

    /// Drop expired undo entries. Returns the ids whose window closed.
    pub fn sweep_undo(&self) -> Vec<RecordId> {
        let expired = self.lock().undo.tick();
        expired
            .into_iter()
            .map(|record| {
                debug!(record_id = record.id, "Undo window closed");
                self.emit(EngineEvent::UndoExpired {
                    record_id: record.id,
                });
                record.id
            })
            .collect()
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SyncEngine")
            .field("status", &inner.status)
            .field("records", &inner.records.len())
            .field("pending", &inner.pending.len())
            .finish_non_exhaustive()
    }
}

fn index(records: Vec<Record>) -> RecordSet {
    records.into_iter().map(|record| (record.id, record)).collect()
}
