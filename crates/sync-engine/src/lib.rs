//! Optimistic synchronization between an in-memory record set and the
//! record service.
//!
//! - [`SyncEngine`]: load with snapshot fallback, optimistic update and
//!   delete with rollback, all-or-nothing bulk delete, CSV import/export
//! - [`UndoManager`]: time-boxed restore of deleted records
//! - [`Clock`]: injectable time source ([`SystemClock`], [`ManualClock`])
//!
//! Observers subscribe to [`EngineEvent`]s rather than polling.

mod clock;
mod engine;
mod error;
mod interchange;
mod pending;
mod state;
mod undo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineConfig, RecordSet, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use interchange::{ImportIssue, ImportReport};
pub use pending::{MutationKind, MutationSeq, PendingMutation};
pub use state::{EngineEvent, EngineStatus, ReadyState};
pub use undo::{UndoManager, UndoToken, DEFAULT_UNDO_WINDOW_SECS};
