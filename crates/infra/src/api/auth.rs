//! Bearer token source for the API client
//!
//! The outbound interceptor asks for a token fresh enough for the configured
//! threshold; the inbound interceptor forces a refresh after a 401.

use async_trait::async_trait;
use spatialbias_common::auth::CredentialManager;
use tracing::warn;

use super::errors::ApiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Token to attach to the next request, refreshed first when it expires
    /// within `min_validity_seconds`
    ///
    /// `None` means the request goes out without an `Authorization` header.
    async fn bearer_token(&self, min_validity_seconds: i64) -> Option<String>;

    /// Refresh after the backend rejected the current token
    ///
    /// # Errors
    /// Returns `ApiError::Auth` when no new token could be obtained
    async fn refresh_after_rejection(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl AccessTokenProvider for CredentialManager {
    async fn bearer_token(&self, min_validity_seconds: i64) -> Option<String> {
        // A failed refresh has already logged the user out; the request is
        // still sent and fails server-side.
        if let Err(e) = self.ensure_fresh_token(min_validity_seconds).await {
            warn!(error = %e, "Token refresh failed, sending request unauthenticated");
        }
        self.token().await
    }

    async fn refresh_after_rejection(&self) -> Result<(), ApiError> {
        self.force_refresh()
            .await
            .map_err(|e| ApiError::Auth(format!("Failed to refresh access token: {e}")))
    }
}
