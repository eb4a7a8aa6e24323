//! Push channel error types.

use thiserror::Error;

/// Push channel error type.
///
/// These stay inside the channel: they are logged and answered with a
/// reconnect, never returned to whoever owns the channel.
#[derive(Error, Debug)]
pub enum LiveUpdateError {
    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The connection ended from the other side.
    #[error("Connection closed by server")]
    Closed,
}

/// Result type alias using LiveUpdateError.
pub type LiveUpdateResult<T> = Result<T, LiveUpdateError>;
