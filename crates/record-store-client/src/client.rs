//! REST client for the `/api/users` service.

use crate::error::{StoreError, StoreResult};
use crate::record::{Record, RecordFields, RecordId};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote CRUD surface the sync engine talks to.
///
/// Implementations make exactly one remote call per method and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `GET /api/users`
    async fn list(&self) -> StoreResult<Vec<Record>>;

    /// `GET /api/users/{id}`
    async fn get(&self, id: RecordId) -> StoreResult<Record>;

    /// `POST /api/users`; the returned record carries the server-assigned id.
    async fn create(&self, fields: &RecordFields) -> StoreResult<Record>;

    /// `PUT /api/users/{id}`; `None` when the service answered without a body.
    async fn update(&self, id: RecordId, fields: &RecordFields) -> StoreResult<Option<Record>>;

    /// `DELETE /api/users/{id}`
    async fn delete(&self, id: RecordId) -> StoreResult<()>;
}

/// Error body shapes the service uses: `{message}` for 404s, `{error}` for 500s.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// HTTP implementation of [`RecordStore`].
#[derive(Clone)]
pub struct HttpRecordStore {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpRecordStore {
    /// Create a client for the service rooted at `base_url`
    /// (e.g. `http://localhost:3000`).
    pub fn new(base_url: impl Into<String>) -> StoreResult<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> StoreResult<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The service root this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn users_url(&self) -> String {
        format!("{}/api/users", self.base_url)
    }

    fn user_url(&self, id: RecordId) -> String {
        format!("{}/api/users/{}", self.base_url, id)
    }

    /// Turn a non-2xx response into `StoreError::Http`.
    async fn check_response(&self, response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        error!(status = status.as_u16(), message = %message, "Record service request failed");
        Err(StoreError::Http {
            status: status.as_u16(),
            message,
        })
    }

    /// Check the status, then decode the body as `T`.
    async fn read_json<T: DeserializeOwned>(&self, response: reqwest::Response) -> StoreResult<T> {
        let response = self.check_response(response).await?;
        let body = response.text().await?;
        decode_body(&body)
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self) -> StoreResult<Vec<Record>> {
        debug!("Listing records");
        let response = self.http_client.get(self.users_url()).send().await?;
        let records: Vec<Record> = self.read_json(response).await?;
        debug!(count = records.len(), "Listed records");
        Ok(records)
    }

    async fn get(&self, id: RecordId) -> StoreResult<Record> {
        debug!(id, "Fetching record");
        let response = self.http_client.get(self.user_url(id)).send().await?;
        self.read_json(response).await
    }

    async fn create(&self, fields: &RecordFields) -> StoreResult<Record> {
        debug!("Creating record");
        let response = self
            .http_client
            .post(self.users_url())
            .json(fields)
            .send()
            .await?;
        let record: Record = self.read_json(response).await?;
        debug!(id = record.id, "Record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, fields: &RecordFields) -> StoreResult<Option<Record>> {
        debug!(id, "Updating record");
        let response = self
            .http_client
            .put(self.user_url(id))
            .json(fields)
            .send()
            .await?;
        let response = self.check_response(response).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode_body(&body).map(Some)
    }

    async fn delete(&self, id: RecordId) -> StoreResult<()> {
        debug!(id, "Deleting record");
        let response = self.http_client.delete(self.user_url(id)).send().await?;
        self.check_response(response).await?;
        debug!(id, "Record deleted");
        Ok(())
    }
}

impl std::fmt::Debug for HttpRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordStore")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

fn decode_body<T: DeserializeOwned>(body: &str) -> StoreResult<T> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = HttpRecordStore::new("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.users_url(), "http://localhost:3000/api/users");
        assert_eq!(client.user_url(42), "http://localhost:3000/api/users/42");
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"message":"User not found"}"#).as_deref(),
            Some("User not found")
        );
        assert_eq!(
            error_message(r#"{"error":"SQLITE_BUSY"}"#).as_deref(),
            Some("SQLITE_BUSY")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
    }

    #[test]
    fn test_decode_body_mismatch_is_decode_error() {
        let result: StoreResult<Vec<Record>> = decode_body(r#"{"not":"a list"}"#);
        assert!(matches!(result, Err(StoreError::Decode(_))));
    }

    #[test]
    fn test_debug_hides_client_internals() {
        let client = HttpRecordStore::new("http://localhost:3000").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("localhost:3000"));
        assert!(!debug.contains("http_client"));
    }
}
