//! API-specific error types
//!
//! Classifies transport failures; the retry policy only reacts to
//! [`ApiErrorCategory::Authentication`].

use std::time::Duration;

use spatialbias_core::TransportError;
use spatialbias_domain::RemoteIssue;
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// 401 - retry once after a forced token refresh
    Authentication,
    /// 422 with structured issues - non-retryable
    Validation,
    /// Server errors (5xx) - non-retryable here
    Server,
    /// Client errors (4xx except 401/422) - non-retryable
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Configuration or decoding problems - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request validation failed with {} issue(s)", .0.len())]
    Validation(Vec<RemoteIssue>),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("Client error {status}: {body}")]
    Client { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth(_) => ApiErrorCategory::Authentication,
            Self::Validation(_) => ApiErrorCategory::Validation,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::Decode(_) => ApiErrorCategory::Config,
        }
    }

    /// Whether a forced refresh and a replay may fix this error
    pub fn is_auth_rejection(&self) -> bool {
        self.category() == ApiErrorCategory::Authentication
    }
}

impl From<ApiError> for TransportError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Auth(message) => Self::Unauthorized(message),
            ApiError::Validation(issues) => Self::RemoteValidation(issues),
            ApiError::Server { status, body } | ApiError::Client { status, body } => {
                Self::Http { status, body }
            }
            ApiError::Network(message) => Self::Network(message),
            ApiError::Timeout(after) => Self::Timeout(format!("no response after {after:?}")),
            ApiError::Decode(message) => Self::Decode(message),
            ApiError::Config(message) => Self::Config(message),
        }
    }
}
