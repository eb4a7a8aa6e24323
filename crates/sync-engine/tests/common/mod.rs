//! Shared fixtures for sync engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration;
use local_snapshot::{LocalSnapshot, MemorySnapshotStore};
use record_store_client::{Record, RecordFields, RecordId, RecordStore, StoreError, StoreResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use sync_engine::{EngineConfig, ManualClock, SyncEngine};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Get(RecordId),
    Create(RecordFields),
    Update(RecordId, RecordFields),
    Delete(RecordId),
}

/// Scripted in-memory record service.
///
/// Failures are injected per operation and record id. A gate holds a
/// request open until the test releases it.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<BTreeMap<RecordId, Record>>,
    next_id: Mutex<RecordId>,
    list_failure: Mutex<Option<StoreError>>,
    create_failure: Mutex<Option<StoreError>>,
    failures: Mutex<HashMap<(Op, RecordId), StoreError>>,
    failures_once: Mutex<HashMap<(Op, RecordId), StoreError>>,
    gates: Mutex<HashMap<(Op, RecordId), Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeStore {
    pub fn with_records(records: &[Record]) -> Arc<Self> {
        let store = Self::default();
        *store.next_id.lock().unwrap() = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        *store.records.lock().unwrap() = records.iter().map(|r| (r.id, r.clone())).collect();
        Arc::new(store)
    }

    pub fn fail_list(&self, error: StoreError) {
        *self.list_failure.lock().unwrap() = Some(error);
    }

    pub fn heal_list(&self) {
        *self.list_failure.lock().unwrap() = None;
    }

    pub fn fail_create(&self, error: StoreError) {
        *self.create_failure.lock().unwrap() = Some(error);
    }

    pub fn fail(&self, op: Op, id: RecordId, error: StoreError) {
        self.failures.lock().unwrap().insert((op, id), error);
    }

    /// Fail only the next `op` on `id`.
    pub fn fail_once(&self, op: Op, id: RecordId, error: StoreError) {
        self.failures_once.lock().unwrap().insert((op, id), error);
    }

    /// Hold the next `op` on `id` until the returned gate is notified.
    pub fn gate(&self, op: Op, id: RecordId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert((op, id), gate.clone());
        gate
    }

    pub fn remote_records(&self) -> Vec<Record> {
        self.records.lock().unwrap().values().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls other than the initial list.
    pub fn mutation_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::List | Call::Get(_)))
            .collect()
    }

    fn record_call(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pass_gate(&self, op: Op, id: RecordId) {
        let gate = self.gates.lock().unwrap().remove(&(op, id));
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn injected(&self, op: Op, id: RecordId) -> Option<StoreError> {
        if let Some(error) = self.failures_once.lock().unwrap().remove(&(op, id)) {
            return Some(error);
        }
        self.failures.lock().unwrap().get(&(op, id)).cloned()
    }
}

#[async_trait]
impl RecordStore for FakeStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        self.record_call(Call::List);
        if let Some(error) = self.list_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.remote_records())
    }

    async fn get(&self, id: RecordId) -> StoreResult<Record> {
        self.record_call(Call::Get(id));
        self.records
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create(&self, fields: &RecordFields) -> StoreResult<Record> {
        self.record_call(Call::Create(fields.clone()));
        if let Some(error) = self.create_failure.lock().unwrap().clone() {
            return Err(error);
        }
        let mut next_id = self.next_id.lock().unwrap();
        let id = (*next_id).max(1);
        *next_id = id + 1;
        let record = Record::new(id, fields.name.clone(), fields.email.clone());
        self.records.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: RecordId, fields: &RecordFields) -> StoreResult<Option<Record>> {
        self.record_call(Call::Update(id, fields.clone()));
        self.pass_gate(Op::Update, id).await;
        if let Some(error) = self.injected(Op::Update, id) {
            return Err(error);
        }
        let mut records = self.records.lock().unwrap();
        let record = records.get_mut(&id).ok_or_else(not_found)?;
        *record = record.with_fields(fields);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.record_call(Call::Delete(id));
        self.pass_gate(Op::Delete, id).await;
        if let Some(error) = self.injected(Op::Delete, id) {
            return Err(error);
        }
        self.records
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(not_found)
    }
}

pub fn not_found() -> StoreError {
    StoreError::Http {
        status: 404,
        message: "User not found".to_string(),
    }
}

pub fn server_error() -> StoreError {
    StoreError::Http {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

pub fn offline() -> StoreError {
    StoreError::Network("connection refused".to_string())
}

pub fn ann() -> Record {
    Record::new(1, "Ann", "ann@x.com")
}

pub fn bob() -> Record {
    Record::new(2, "Bob", "bob@x.com")
}

pub fn cy() -> Record {
    Record::new(3, "Cy", "cy@x.com")
}

pub fn trio() -> Vec<Record> {
    vec![ann(), bob(), cy()]
}

pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub store: Arc<FakeStore>,
    pub snapshot: Arc<MemorySnapshotStore>,
    pub clock: Arc<ManualClock>,
}

pub fn harness(store: Arc<FakeStore>) -> Harness {
    harness_with_snapshot(store, Arc::new(MemorySnapshotStore::new()))
}

pub fn harness_with_snapshot(store: Arc<FakeStore>, snapshot: Arc<MemorySnapshotStore>) -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let config = EngineConfig {
        undo_window: Duration::seconds(4),
        ..EngineConfig::default()
    };
    let engine = SyncEngine::with_clock(
        store.clone(),
        LocalSnapshot::new(snapshot.clone()),
        config,
        clock.clone(),
    );
    Harness {
        engine: Arc::new(engine),
        store,
        snapshot,
        clock,
    }
}

/// Harness with the engine already loaded from `records`.
pub async fn loaded(records: &[Record]) -> Harness {
    let harness = harness(FakeStore::with_records(records));
    harness.engine.initialize().await;
    harness
}

/// Yield until `condition` holds. Panics if it never does.
pub async fn eventually(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
