//! Best-effort push channel that merges externally pushed record sets into
//! the sync engine.
//!
//! The channel connects to a WebSocket endpoint emitting
//! `{"type": "users:update", "payload": [Record]}` frames and hands each one
//! to an [`ExternalUpdateSink`], normally the [`sync_engine::SyncEngine`].
//! Missing or flaky endpoints only cost liveness.

mod channel;
mod error;
mod message;
mod sink;

pub use channel::{ConnectionState, LiveUpdateChannel, LiveUpdateConfig, LiveUpdateHandle};
pub use error::{LiveUpdateError, LiveUpdateResult};
pub use message::{PushMessage, USERS_UPDATE};
pub use sink::ExternalUpdateSink;
