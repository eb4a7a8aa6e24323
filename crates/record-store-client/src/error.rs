//! Error types for record service calls.

use thiserror::Error;

/// Failure of a single remote call.
///
/// Cloneable so callers can keep the last failure around (the engine stores it
/// in its ready state) without re-running the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transport-level failure: connection refused, timeout, TLS, reset.
    ///
    /// Retryable by the caller.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-2xx status.
    ///
    /// 404 means the record is already gone; everything else is a server fault.
    #[error("HTTP error: {status} - {message}")]
    Http {
        /// The HTTP status code returned by the service.
        status: u16,
        /// The `message`/`error` field of the body, or the status reason.
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// True for `Http { status: 404, .. }`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Http { status: 404, .. })
    }

    /// True when retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Http { status, .. } => *status >= 500,
            StoreError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
