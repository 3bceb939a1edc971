//! Port interfaces for reaching the audit service
//!
//! The HTTP transport (with credential refresh and the 401 retry) lives in
//! the infra crate; the orchestrator only sees this trait.

use async_trait::async_trait;
use serde_json::Value;
use spatialbias_domain::RemoteIssue;
use thiserror::Error;

/// Failure of a single POST, after any authentication retry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// HTTP 422 with structured per-field issues
    #[error("Remote validation failed with {} issue(s)", .0.len())]
    RemoteValidation(Vec<RemoteIssue>),

    /// HTTP 401 after the retry budget was spent
    #[error("HTTP 401 Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request took longer than the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Success status with a body that is not the expected JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Successful body that violates the response contract
    #[error("Response validation failed: {0}")]
    ResponseContract(String),

    /// Transport could not be set up (bad base URL, TLS backend)
    #[error("Transport configuration error: {0}")]
    Config(String),
}

impl TransportError {
    /// HTTP status, when the failure carries one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::RemoteValidation(_) => Some(422),
            Self::Unauthorized(_) => Some(401),
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Sends validated request bodies to the service
#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// POST `body` as JSON to `path` and return the decoded JSON response
    /// (`Value::Null` for empty bodies)
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError>;
}
