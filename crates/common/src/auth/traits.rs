//! Ports used by the credential manager
//!
//! These traits abstract the identity provider, token persistence and the
//! user-facing redirect so the session logic can be tested with in-memory
//! doubles.

use async_trait::async_trait;

use super::credential_manager::CredentialError;
use super::types::{SessionCheck, TokenSet};

/// Identity provider operations (OpenID Connect)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Check for an existing session without any interactive prompt
    ///
    /// # Arguments
    /// * `stored` - Token set persisted by a previous run, if any
    ///
    /// # Errors
    /// Returns error if the provider cannot be reached or answers with
    /// anything other than a definite "not authenticated"
    async fn check_session(&self, stored: Option<&TokenSet>)
        -> Result<SessionCheck, CredentialError>;

    /// Exchange a refresh token for a new token set
    ///
    /// # Errors
    /// Returns error if the refresh token is rejected or the call fails
    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, CredentialError>;

    /// Terminate the provider-side session
    ///
    /// # Errors
    /// Returns error if the provider call fails
    async fn end_session(&self, tokens: &TokenSet) -> Result<(), CredentialError>;
}

/// Token persistence between runs
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store the session's token set
    ///
    /// # Errors
    /// Returns error if storage fails
    async fn store(&self, tokens: &TokenSet) -> Result<(), CredentialError>;

    /// Load the stored token set, `None` when nothing is stored
    ///
    /// # Errors
    /// Returns error if the store exists but cannot be read
    async fn load(&self) -> Result<Option<TokenSet>, CredentialError>;

    /// Delete the stored token set (idempotent)
    ///
    /// # Errors
    /// Returns error if deletion fails
    async fn delete(&self) -> Result<(), CredentialError>;
}

/// Sends the user somewhere else (landing page after logout)
pub trait Navigator: Send + Sync {
    fn redirect(&self, url: &str);
}
