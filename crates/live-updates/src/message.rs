//! Push protocol messages.

use crate::error::LiveUpdateResult;
use record_store_client::Record;
use serde::{Deserialize, Serialize};

/// Message type tag for a full record set push.
pub const USERS_UPDATE: &str = "users:update";

/// A message received on the push channel.
///
/// Wire form: `{"type": "users:update", "payload": [Record, ...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PushMessage {
    #[serde(rename = "users:update")]
    UsersUpdate(Vec<Record>),
}

impl PushMessage {
    /// Parse from JSON text. Unknown types and bad payloads are errors.
    pub fn from_json(text: &str) -> LiveUpdateResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> LiveUpdateResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
