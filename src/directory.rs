//! Upstream patient-directory client.
//!
//! One GET against the configured endpoint with name/limit query
//! parameters, optional auth header, and a bounded timeout. The directory
//! is reached through the `Directory` trait so the assistant can be tested
//! against `MockDirectory` without a network.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AuthMode, DirectoryConfig};
use crate::envelope::EnvelopeError;

/// Upper bound on the row limit sent upstream.
const MAX_LIMIT: u32 = 100;

/// Errors from the upstream call. Only transport-level problems surface
/// here — unexpected-but-well-formed JSON is the normalizer's business.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    /// Connect failure or timeout. The call is abandoned, never retried.
    #[error("directory unreachable: {0}")]
    Unreachable(String),
    /// Upstream answered with a non-success HTTP status.
    #[error("directory request failed with status {code}")]
    Status { code: u16 },
    /// Upstream answered 2xx but the body is not usable JSON, or the
    /// envelope shape is unrecognizable.
    #[error("directory returned a malformed payload: {0}")]
    Malformed(String),
}

impl From<EnvelopeError> for DirectoryError {
    fn from(err: EnvelopeError) -> Self {
        DirectoryError::Malformed(err.to_string())
    }
}

/// A structured patient-list query, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientQuery {
    pub name: Option<String>,
    pub limit: u32,
}

/// Seam to the upstream directory. Implementations return the raw
/// top-level JSON value; callers normalize it.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn fetch_patients(&self, query: &PatientQuery) -> Result<Value, DirectoryError>;
}

/// Clamp a requested row limit into the range the upstream accepts.
pub fn clamp_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIMIT)
}

// ═══════════════════════════════════════════
// HTTP implementation
// ═══════════════════════════════════════════

/// HTTP client for the configured patient directory.
pub struct HttpDirectory {
    config: DirectoryConfig,
    client: reqwest::Client,
}

impl HttpDirectory {
    /// Build a client with the configured timeout baked in.
    pub fn new(config: DirectoryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        let config = DirectoryConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };

        Self { config, client }
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.config.base_url, self.config.patients_path)
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn fetch_patients(&self, query: &PatientQuery) -> Result<Value, DirectoryError> {
        let mut request = self
            .client
            .get(self.endpoint())
            .header("Content-Type", "application/json")
            .query(&[("limit", clamp_limit(query.limit).to_string())]);

        if let Some(name) = &query.name {
            request = request.query(&[(self.config.name_param.as_str(), name.as_str())]);
        }

        request = match &self.config.auth {
            AuthMode::None => request,
            AuthMode::Bearer { token } => request.bearer_auth(token),
            AuthMode::ApiKey { header, token } => request.header(header.as_str(), token.as_str()),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DirectoryError::Unreachable(format!(
                    "request timed out after {}s",
                    self.config.timeout_secs
                ))
            } else if e.is_connect() {
                DirectoryError::Unreachable(format!("cannot connect to {}", self.endpoint()))
            } else {
                DirectoryError::Unreachable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                code: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| DirectoryError::Malformed(e.to_string()))
    }
}

// ═══════════════════════════════════════════
// Mock implementation for tests
// ═══════════════════════════════════════════

/// Mock directory — returns a configurable reply and records every query
/// it receives.
pub struct MockDirectory {
    reply: Result<Value, DirectoryError>,
    calls: std::sync::Mutex<Vec<PatientQuery>>,
}

impl MockDirectory {
    pub fn returning(value: Value) -> Self {
        Self {
            reply: Ok(value),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: DirectoryError) -> Self {
        Self {
            reply: Err(err),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queries observed so far, in call order.
    pub fn recorded_queries(&self) -> Vec<PatientQuery> {
        self.calls.lock().expect("mock lock").clone()
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn fetch_patients(&self, query: &PatientQuery) -> Result<Value, DirectoryError> {
        self.calls.lock().expect("mock lock").push(query.clone());
        self.reply.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn config_for(base_url: &str) -> DirectoryConfig {
        DirectoryConfig {
            base_url: base_url.to_string(),
            patients_path: "/Patient".to_string(),
            timeout_secs: 2,
            auth: AuthMode::None,
            name_param: "name".to_string(),
            default_limit: 10,
        }
    }

    /// Spin a one-route stub directory and return its base URL.
    async fn stub_directory(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn clamp_limit_bounds() {
        assert_eq!(clamp_limit(0), 1);
        assert_eq!(clamp_limit(10), 10);
        assert_eq!(clamp_limit(100), 100);
        assert_eq!(clamp_limit(5000), 100);
    }

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = HttpDirectory::new(config_for("http://localhost:5010/api/"));
        assert_eq!(client.endpoint(), "http://localhost:5010/api/Patient");
    }

    #[tokio::test]
    async fn mock_records_queries() {
        let mock = MockDirectory::returning(json!([]));
        let query = PatientQuery {
            name: Some("Smith".into()),
            limit: 5,
        };
        mock.fetch_patients(&query).await.unwrap();
        assert_eq!(mock.recorded_queries(), vec![query]);
    }

    #[tokio::test]
    async fn mock_failing_returns_error() {
        let mock = MockDirectory::failing(DirectoryError::Status { code: 503 });
        let err = mock
            .fetch_patients(&PatientQuery { name: None, limit: 1 })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Status { code: 503 }));
    }

    #[tokio::test]
    async fn sends_name_and_clamped_limit_params() {
        let app = Router::new().route(
            "/Patient",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({"patients": [], "echo": params}))
            }),
        );
        let base = stub_directory(app).await;

        let client = HttpDirectory::new(config_for(&base));
        let value = client
            .fetch_patients(&PatientQuery {
                name: Some("Smith".into()),
                limit: 5000,
            })
            .await
            .unwrap();

        assert_eq!(value["echo"]["name"], "Smith");
        assert_eq!(value["echo"]["limit"], "100");
    }

    #[tokio::test]
    async fn sends_bearer_auth_header() {
        let app = Router::new().route(
            "/Patient",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("Authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"patients": [], "auth": auth}))
            }),
        );
        let base = stub_directory(app).await;

        let mut config = config_for(&base);
        config.auth = AuthMode::Bearer {
            token: "sesame".into(),
        };
        let client = HttpDirectory::new(config);
        let value = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap();
        assert_eq!(value["auth"], "Bearer sesame");
    }

    #[tokio::test]
    async fn sends_api_key_header() {
        let app = Router::new().route(
            "/Patient",
            get(|headers: HeaderMap| async move {
                let key = headers
                    .get("X-API-Key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"patients": [], "key": key}))
            }),
        );
        let base = stub_directory(app).await;

        let mut config = config_for(&base);
        config.auth = AuthMode::ApiKey {
            header: "X-API-Key".into(),
            token: "k-123".into(),
        };
        let client = HttpDirectory::new(config);
        let value = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap();
        assert_eq!(value["key"], "k-123");
    }

    #[tokio::test]
    async fn non_success_status_maps_to_status_error() {
        let app = Router::new().route(
            "/Patient",
            get(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = stub_directory(app).await;

        let client = HttpDirectory::new(config_for(&base));
        let err = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Status { code: 500 }));
    }

    #[tokio::test]
    async fn non_json_body_maps_to_malformed() {
        let app = Router::new().route("/Patient", get(|| async { "this is not json" }));
        let base = stub_directory(app).await;

        let client = HttpDirectory::new(config_for(&base));
        let err = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Malformed(_)));
    }

    #[tokio::test]
    async fn connect_failure_maps_to_unreachable() {
        // Bind then drop a listener so the port is known-dead.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpDirectory::new(config_for(&format!("http://{addr}")));
        let err = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_)));
    }

    #[tokio::test]
    async fn timeout_maps_to_unreachable() {
        let app = Router::new().route(
            "/Patient",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                "too late"
            }),
        );
        let base = stub_directory(app).await;

        let mut config = config_for(&base);
        config.timeout_secs = 1;
        let client = HttpDirectory::new(config);
        let err = client
            .fetch_patients(&PatientQuery { name: None, limit: 10 })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Unreachable(_)));
    }
}
