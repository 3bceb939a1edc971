//! Session token types
//!
//! Shared by the credential manager, the identity provider adapters and the
//! token stores.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OpenID Connect token set with expiry metadata
///
/// - Optional refresh token (some flows don't issue them)
/// - Both `expires_in` (duration) and `expires_at` (timestamp)
/// - ID token kept for the end-session call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer credential for API calls
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token (JWT) containing user claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a new `TokenSet` with calculated expiration time
    ///
    /// The `expires_at` timestamp is calculated from `expires_in`; a
    /// non-positive lifetime leaves it unset.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        id_token: Option<String>,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self {
            access_token,
            refresh_token,
            id_token,
            token_type: "Bearer".to_string(),
            expires_in,
            expires_at,
            scope,
        }
    }

    /// Check if the access token is expired or will expire within the given
    /// threshold
    ///
    /// # Returns
    /// `true` if the token is expired or will expire within the threshold,
    /// `false` if it's still valid beyond the threshold or if no expiry is set
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let threshold = chrono::Duration::seconds(threshold_seconds);
                Utc::now() + threshold >= expires_at
            }
            None => false,
        }
    }

    /// Get seconds until token expiration
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// Value for the `Authorization` header
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Token endpoint response (RFC 6749 section 5.1)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        let mut tokens = Self::new(
            response.access_token,
            response.refresh_token,
            response.id_token,
            response.expires_in,
            response.scope,
        );
        tokens.token_type = response.token_type;
        tokens
    }
}

/// Error body of a token endpoint (RFC 6749 section 5.2)
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl OAuthError {
    /// The grant (refresh token) is expired, revoked or unknown
    #[must_use]
    pub fn is_invalid_grant(&self) -> bool {
        self.error == "invalid_grant"
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

/// Outcome of a silent session check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    /// A usable session exists
    Authenticated(TokenSet),
    /// No session; the user must sign in elsewhere
    NotAuthenticated,
}

/// Snapshot of the session for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Authentication is administratively enabled
    pub enabled: bool,
    pub authenticated: bool,
    pub seconds_until_expiry: Option<i64>,
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::types.
    use super::*;

    /// Validates `TokenSet::is_expired` around the refresh threshold.
    ///
    /// Assertions:
    /// - A token with 10s left counts as expired under a 30s threshold.
    /// - The same token is not expired under a 0s threshold.
    #[test]
    fn test_is_expired_threshold() {
        let tokens = TokenSet::new("access".into(), None, None, 10, None);

        assert!(tokens.is_expired(30));
        assert!(!tokens.is_expired(0));
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let tokens = TokenSet::new("access".into(), None, None, 0, None);

        assert!(tokens.expires_at.is_none());
        assert!(!tokens.is_expired(3600));
        assert_eq!(tokens.seconds_until_expiry(), None);
    }

    #[test]
    fn test_token_response_conversion() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","token_type":"bearer","expires_in":300}"#,
        )
        .unwrap();
        let tokens = TokenSet::from(response);

        assert_eq!(tokens.refresh_token.as_deref(), Some("r"));
        assert_eq!(tokens.token_type, "bearer");
        assert!(tokens.seconds_until_expiry().unwrap() > 290);
        assert_eq!(tokens.bearer(), "Bearer a");
    }

    #[test]
    fn test_oauth_error_invalid_grant() {
        let err: OAuthError = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Token is not active"}"#,
        )
        .unwrap();

        assert!(err.is_invalid_grant());
        assert_eq!(err.to_string(), "invalid_grant: Token is not active");
    }

    #[test]
    fn test_token_set_persists_expiry() {
        let tokens = TokenSet::new("a".into(), Some("r".into()), None, 60, None);
        let json = serde_json::to_string(&tokens).unwrap();
        let restored: TokenSet = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, tokens);
    }
}
