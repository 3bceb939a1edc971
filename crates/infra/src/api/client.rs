//! API client with credential interceptors and bounded 401 retry
//!
//! - Outbound: refresh the token when it expires within the configured
//!   threshold, then attach `Authorization: Bearer <token>` when one exists
//! - Inbound: on 401, force one refresh and replay the request, as allowed
//!   by the [`RetryPolicy`]
//!
//! One shared instance serves every operation mode.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use spatialbias_core::{
    http_validation_error_contract, validation_issue_contract, AnalysisTransport, TransportError,
};
use spatialbias_domain::constants::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_MIN_TOKEN_VALIDITY_SECS};
use spatialbias_domain::{ApiConfig, RemoteIssue};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::auth::AccessTokenProvider;
use super::errors::ApiError;
use super::retry::{RetryDecision, RetryPolicy};
use crate::http::HttpClient;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL of the audit service (e.g. "https://audit.example.org")
    pub base_url: String,
    /// Timeout for one attempt
    pub timeout: Duration,
    /// Outbound refresh threshold in seconds
    pub min_token_validity_secs: i64,
    /// Attempts per request
    pub retry: RetryPolicy,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
            min_token_validity_secs: api.min_token_validity_secs,
            retry: RetryPolicy::new(api.max_attempts),
        }
    }
}

impl ApiClientConfig {
    /// Defaults pointed at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            min_token_validity_secs: DEFAULT_MIN_TOKEN_VALIDITY_SECS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Transport client for the audit service
pub struct ApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    config: ApiClientConfig,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be
    /// created
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(config.base_url.trim())
            .map_err(|e| ApiError::Config(format!("Invalid base URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!("Base URL '{}' cannot be a base", base_url)));
        }

        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(1)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http_client, auth, config, base_url })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> RetryPolicy {
        self.config.retry
    }

    /// Execute a POST request with a JSON body
    ///
    /// Returns the decoded JSON body, `Value::Null` for 204/205 or an empty
    /// body.
    ///
    /// # Errors
    ///
    /// Returns error if every allowed attempt fails
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        let mut attempt = 1;

        loop {
            debug!(url = %url, attempt, "POST request");

            let error = match self.send_once(&url, body).await {
                Ok(value) => {
                    info!(path = %path, attempt, "POST request successful");
                    return Ok(value);
                }
                Err(error) => error,
            };

            match self.config.retry.should_retry(&error, attempt) {
                RetryDecision::RefreshAndRetry => {
                    warn!(attempt, "Request rejected with 401, forcing token refresh");
                    if let Err(refresh_error) = self.auth.refresh_after_rejection().await {
                        warn!(error = %refresh_error, "Forced refresh failed, giving up");
                        return Err(error);
                    }
                    attempt += 1;
                }
                RetryDecision::Stop => {
                    debug!(attempt, error = %error, "POST request failed");
                    return Err(error);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        let token = self.auth.bearer_token(self.config.min_token_validity_secs).await;

        let mut request = self
            .http_client
            .request(Method::POST, url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response =
            self.http_client.execute(request).await.map_err(|e| self.map_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, body_text));
        }

        // These status codes have no body per RFC 9110
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Ok(Value::Null);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to read response: {}", e)))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
    }

    fn map_request_error(&self, err: &reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else if err.is_builder() {
            ApiError::Config(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    fn map_status_error(status: StatusCode, body: String) -> ApiError {
        let code = status.as_u16();
        if status == StatusCode::UNAUTHORIZED {
            let message = if body.is_empty() { status.to_string() } else { body };
            ApiError::Auth(message)
        } else if status == StatusCode::UNPROCESSABLE_ENTITY {
            ApiError::Validation(parse_validation_issues(&body))
        } else if status.is_server_error() {
            ApiError::Server { status: code, body }
        } else {
            ApiError::Client { status: code, body }
        }
    }
}

/// Read the `detail` list of a 422 body
///
/// Items that do not match the issue shape are dropped one by one; a body
/// without a `detail` list yields no issues.
fn parse_validation_issues(body: &str) -> Vec<RemoteIssue> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "422 body is not JSON");
            return Vec::new();
        }
    };
    if let Err(e) = http_validation_error_contract().validate(&value) {
        warn!(error = %e, "422 body does not fully match the validation error shape");
    }

    let Some(items) = value.get("detail").and_then(Value::as_array) else {
        return Vec::new();
    };
    let issues: Vec<RemoteIssue> = items.iter().filter_map(decode_issue).collect();
    if issues.len() < items.len() {
        warn!(kept = issues.len(), dropped = items.len() - issues.len(), "Skipped malformed 422 items");
    }
    issues
}

fn decode_issue(item: &Value) -> Option<RemoteIssue> {
    let checked = validation_issue_contract().validate(item).ok()?;
    serde_json::from_value(Value::Object(checked)).ok()
}

#[async_trait]
impl AnalysisTransport for ApiClient {
    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.post_json(path, body).await.map_err(TransportError::from)
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".to_string()))?;

        ApiClient::new(config, auth)
    }
}
