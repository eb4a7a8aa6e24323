//! Engine status and change notifications.

use crate::pending::MutationKind;
use record_store_client::{RecordId, StoreError};

/// Where the engine is in its load lifecycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EngineStatus {
    #[default]
    Uninitialized,
    Loading,
    Ready(ReadyState),
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready(_))
    }

    /// True when the set on screen came from the local snapshot or from a
    /// load that has since failed to refresh.
    pub fn is_degraded(&self) -> bool {
        matches!(self, EngineStatus::Ready(ReadyState { degraded: true, .. }))
    }

    /// The blocking load error, when no data could be shown at all.
    pub fn load_error(&self) -> Option<&StoreError> {
        match self {
            EngineStatus::Ready(ReadyState { error, .. }) => error.as_ref(),
            _ => None,
        }
    }
}

/// Outcome of the most recent load.
///
/// `error` is set only when neither the service nor the local snapshot
/// produced a record set. `degraded` means records are shown but may be stale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadyState {
    pub error: Option<StoreError>,
    pub degraded: bool,
}

impl ReadyState {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn degraded() -> Self {
        Self {
            error: None,
            degraded: true,
        }
    }

    pub fn failed(error: StoreError) -> Self {
        Self {
            error: Some(error),
            degraded: false,
        }
    }
}

/// Broadcast whenever observable engine state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    StatusChanged(EngineStatus),
    /// The authoritative set changed (optimistic apply, confirm, or restore).
    RecordsChanged,
    /// A mutation failed. Optimistic changes it made have been reverted.
    MutationFailed {
        kind: MutationKind,
        record_ids: Vec<RecordId>,
        error: StoreError,
    },
    /// The undo window for a deleted record closed without a redo.
    UndoExpired { record_id: RecordId },
    /// A pushed record set replaced the authoritative set.
    ExternalUpdateApplied { count: usize },
}
