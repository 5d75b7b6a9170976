//! HTTP client for the external client directory.
//!
//! Bookings carry a snapshot of the client's contact data taken from here at
//! the time `client_id` is set. Calls are single-shot: no retries, bounded by
//! the client timeout and guarded by a [`CircuitBreaker`].

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::services::circuit_breaker::CircuitBreaker;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Client not found")]
    NotFound,
    #[error("client directory is temporarily unavailable")]
    CircuitOpen,
    #[error("client directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("client directory responded with status {0}")]
    UnexpectedStatus(StatusCode),
    #[error("client directory returned an unreadable record: {0}")]
    InvalidRecord(String),
}

/// Record shape served by `GET {base}/{client_id}`.
#[derive(Debug, Deserialize)]
struct DirectoryRecord {
    full_name: String,
    email: String,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    is_vip: Option<bool>,
}

/// Client fields copied onto a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientSnapshot {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_vip: bool,
}

impl From<DirectoryRecord> for ClientSnapshot {
    fn from(record: DirectoryRecord) -> Self {
        Self {
            name: record.full_name,
            email: record.email,
            phone: record.phone,
            is_vip: record.is_vip.unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct ClientDirectory {
    base_url: String,
    http_client: reqwest::Client,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl ClientDirectory {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        circuit_breaker: CircuitBreaker,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            circuit_breaker: Arc::new(circuit_breaker),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(
            config.client_directory.base_url.clone(),
            Duration::from_secs(config.client_directory.timeout_secs),
            CircuitBreaker::new(
                config.circuit_breaker.failure_threshold,
                config.circuit_breaker.timeout_seconds,
            ),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Looks up one client. A 404 or a `null` record is
    /// [`DirectoryError::NotFound`]; anything else that is not a readable
    /// record is an upstream failure.
    pub async fn fetch(&self, client_id: i64) -> Result<ClientSnapshot, DirectoryError> {
        if !self.circuit_breaker.can_execute() {
            warn!(client_id, "Circuit breaker is OPEN - skipping client directory call");
            return Err(DirectoryError::CircuitOpen);
        }

        let outcome = self.request(client_id).await;
        match &outcome {
            Ok(_) | Err(DirectoryError::NotFound) => self.circuit_breaker.record_success(),
            Err(e) => {
                warn!(client_id, error = %e, "client directory call failed");
                self.circuit_breaker.record_failure();
            }
        }
        outcome
    }

    async fn request(&self, client_id: i64) -> Result<ClientSnapshot, DirectoryError> {
        let url = format!("{}/{}", self.base_url, client_id);
        debug!(%url, "fetching client from directory");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::NotFound);
        }
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus(status));
        }

        let record: Option<DirectoryRecord> = response
            .json()
            .await
            .map_err(|e| DirectoryError::InvalidRecord(e.to_string()))?;

        record.map(ClientSnapshot::from).ok_or(DirectoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory(server: &MockServer, timeout: Duration, threshold: u32) -> ClientDirectory {
        ClientDirectory::new(
            format!("{}/clients/", server.uri()),
            timeout,
            CircuitBreaker::new(threshold, 60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_maps_record_to_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "full_name": "Ada Lovelace",
                "email": "ada@example.com",
                "phone": "+44 20 0000",
                "is_vip": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let snapshot = directory(&server, Duration::from_secs(2), 5).fetch(7).await.unwrap();
        assert_eq!(
            snapshot,
            ClientSnapshot {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                phone: Some("+44 20 0000".into()),
                is_vip: true,
            }
        );
    }

    #[tokio::test]
    async fn missing_optional_fields_get_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "Grace Hopper",
                "email": "grace@example.com"
            })))
            .mount(&server)
            .await;

        let snapshot = directory(&server, Duration::from_secs(2), 5).fetch(3).await.unwrap();
        assert_eq!(snapshot.phone, None);
        assert!(!snapshot.is_vip);
    }

    #[tokio::test]
    async fn not_found_status_and_null_body_are_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Client not found"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/clients/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let dir = directory(&server, Duration::from_secs(2), 1);
        assert!(matches!(dir.fetch(404).await, Err(DirectoryError::NotFound)));
        assert!(matches!(dir.fetch(5).await, Err(DirectoryError::NotFound)));
        // a clean "no such client" does not count against the directory
        assert!(dir.circuit_breaker.can_execute());
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/9"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = directory(&server, Duration::from_secs(2), 5).fetch(9).await.unwrap_err();
        assert!(matches!(err, DirectoryError::UnexpectedStatus(s) if s == StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn slow_directory_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"full_name": "Late", "email": "late@example.com"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = directory(&server, Duration::from_millis(100), 5).fetch(1).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Transport(e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn open_breaker_fails_fast_without_calling_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let dir = directory(&server, Duration::from_secs(2), 2);
        assert!(dir.fetch(1).await.is_err());
        assert!(dir.fetch(1).await.is_err());
        assert!(matches!(dir.fetch(1).await, Err(DirectoryError::CircuitOpen)));
    }

    #[tokio::test]
    async fn garbage_body_is_an_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clients/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = directory(&server, Duration::from_secs(2), 5).fetch(2).await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidRecord(_)));
    }
}
