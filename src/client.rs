//! HTTP client for the PingDirectory configuration API.
//!
//! Objects live under `<https_host>/config/v1`. Adds are POSTs to a
//! collection, updates are PATCHes carrying an operation list, and errors
//! come back as `{"schemas": [...], "status": "404", "detail": "..."}`.

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::operations::Operation;

/// Path prefix of the configuration API.
pub const API_PREFIX: &str = "/config/v1";

/// Maximum length of a response body included in logs.
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Errors returned by the configuration API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {detail}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The `detail` of the error body, or the raw body.
        detail: String,
    },

    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON.
    #[error("Failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// A CA certificate file could not be loaded.
    #[error("Failed to load CA certificate '{path}': {reason}")]
    Certificate {
        /// File that failed to load.
        path: String,
        /// Why it failed.
        reason: String,
    },
}

impl ApiError {
    /// HTTP status, when the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable detail suitable for a diagnostic.
    pub fn detail(&self) -> String {
        match self {
            Self::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Error body returned by the configuration API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<String>,
}

fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse {
            detail: Some(detail),
        }) => detail,
        _ => body.to_string(),
    }
}

fn truncate_for_log(body: &str) -> String {
    if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    }
}

/// Client for the configuration API of one server.
#[derive(Clone)]
pub struct ConfigApiClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for ConfigApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigApiClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl ConfigApiClient {
    /// Build a client from resolved provider configuration, applying the TLS
    /// settings.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(concat!(
            "terraform-provider-pingdirectory/",
            env!("CARGO_PKG_VERSION")
        ));

        if config.insecure_trust_all_tls {
            builder = builder.danger_accept_invalid_certs(true);
        } else {
            for path in &config.ca_certificate_pem_files {
                let pem = std::fs::read(path).map_err(|e| ApiError::Certificate {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
                let cert =
                    reqwest::Certificate::from_pem(&pem).map_err(|e| ApiError::Certificate {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        Ok(Self {
            http: builder.build()?,
            base_url: format!("{}{}", config.https_host, API_PREFIX),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// Build a client against an explicit API base URL (including
    /// [`API_PREFIX`]) with default TLS settings.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// Base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(method = %method, path = %path, "Configuration API request");
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .basic_auth(&self.username, Some(&self.password))
            .header(reqwest::header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                status = status.as_u16(),
                body = %truncate_for_log(&body),
                "Configuration API error"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn send_expecting_body(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        Ok(self.send(request).await?.unwrap_or(Value::Null))
    }

    /// Add a new object to `collection`.
    pub async fn add(&self, collection: &str, body: &Value) -> Result<Value, ApiError> {
        self.send_expecting_body(self.request(Method::POST, collection).json(body))
            .await
    }

    /// Get the object at `path`.
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send_expecting_body(self.request(Method::GET, path)).await
    }

    /// Apply `operations` to the object at `path`.
    pub async fn update(&self, path: &str, operations: &[Operation]) -> Result<Value, ApiError> {
        let body = json!({ "operations": operations });
        self.send_expecting_body(self.request(Method::PATCH, path).json(&body))
            .await
    }

    /// Delete the object at `path`.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path)).await.map(|_| ())
    }

    /// List the objects in `collection`, optionally narrowed by a SCIM filter.
    pub async fn list(&self, collection: &str, filter: Option<&str>) -> Result<Vec<Value>, ApiError> {
        let mut request = self.request(Method::GET, collection);
        if let Some(filter) = filter {
            request = request.query(&[("filter", filter)]);
        }
        let body = self.send_expecting_body(request).await?;
        Ok(match body.get("Resources") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        })
    }
}

/// Percent-encode one path segment (object names may contain spaces).
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_from_api_body() {
        let body = r#"{"schemas":["urn:pingidentity:schemas:common:2.0:Error"],"status":"404","detail":"Connection Criteria 'x' does not exist"}"#;
        assert_eq!(error_detail(body), "Connection Criteria 'x' does not exist");
        assert_eq!(error_detail("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(500);
        let truncated = truncate_for_log(&long);
        assert!(truncated.starts_with(&"x".repeat(MAX_LOG_BODY_LENGTH)));
        assert!(truncated.ends_with("[truncated, 500 bytes total]"));
        assert_eq!(truncate_for_log("short"), "short");
    }

    #[test]
    fn test_api_error_accessors() {
        let err = ApiError::Status {
            status: 404,
            detail: "missing".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), "missing");

        let err = ApiError::Certificate {
            path: "/ca.pem".to_string(),
            reason: "no such file".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(err.detail().contains("/ca.pem"));
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("Accepted Criteria"), "Accepted%20Criteria");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("plain"), "plain");
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ConfigApiClient::new("https://localhost:1443/config/v1/", "u", "p").unwrap();
        assert_eq!(client.base_url(), "https://localhost:1443/config/v1");
    }
}
