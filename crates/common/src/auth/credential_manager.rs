//! Credential manager with guarded refresh
//!
//! Owns the process session:
//! - Silent session check on startup
//! - Refresh before expiry (caller-supplied threshold) and forced refresh
//!   after the backend rejected a token
//! - A single in-flight refresh; callers queued behind it reuse its outcome
//! - Logout with redirect to the landing page

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::traits::{IdentityProvider, Navigator, TokenStore};
use super::types::{SessionCheck, SessionStatus, TokenSet};

/// Error type for credential operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Identity provider call failed
    #[error("Authentication service error: {0}")]
    Provider(String),

    /// Refresh token rejected (expired, revoked, unknown)
    #[error("Session expired: {0}")]
    InvalidGrant(String),

    /// Token store failure
    #[error("Token storage error: {0}")]
    Storage(String),

    /// No session to refresh
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Session has no refresh token
    #[error("No refresh token available")]
    NoRefreshToken,
}

/// Collaborators of an enabled session
struct Backend {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    landing_url: String,
}

/// Last completed refresh, shared with callers that waited on it
struct RefreshRecord {
    outcome: Result<(), CredentialError>,
}

/// Process-wide session, passed by reference to the transport and
/// orchestrator
///
/// Single writer (refresh, logout), many readers (token lookups). Refreshes
/// are serialized; a caller that observed generation `n` before queueing and
/// finds a later generation once it holds the lock returns that refresh's
/// outcome instead of starting another one.
pub struct CredentialManager {
    backend: Option<Backend>,
    current_tokens: RwLock<Option<TokenSet>>,
    refresh_lock: Mutex<RefreshRecord>,
    generation: AtomicU64,
}

impl CredentialManager {
    /// Session manager for anonymous mode (authentication disabled)
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            backend: None,
            current_tokens: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshRecord { outcome: Ok(()) }),
            generation: AtomicU64::new(0),
        }
    }

    /// Session manager backed by an identity provider
    ///
    /// # Arguments
    /// * `provider` - Silent check, refresh and end-session calls
    /// * `store` - Token persistence between runs
    /// * `navigator` - Redirect target handler
    /// * `landing_url` - Where unauthenticated users are sent
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        landing_url: impl Into<String>,
    ) -> Self {
        Self {
            backend: Some(Backend { provider, store, navigator, landing_url: landing_url.into() }),
            ..Self::disabled()
        }
    }

    /// Whether authentication is enabled for this session
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Establish the session
    ///
    /// Returns `false` immediately in anonymous mode. Otherwise performs a
    /// silent check with any stored tokens; a definite "not authenticated"
    /// answer redirects to the landing page and returns `false`.
    ///
    /// # Errors
    /// Returns error if the identity provider fails
    pub async fn initialize(&self) -> Result<bool, CredentialError> {
        let Some(backend) = &self.backend else {
            info!("Authentication disabled, running anonymously");
            return Ok(false);
        };

        let stored = match backend.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Could not read stored session, continuing without it");
                None
            }
        };

        match backend.provider.check_session(stored.as_ref()).await? {
            SessionCheck::Authenticated(tokens) => {
                if let Err(e) = backend.store.store(&tokens).await {
                    warn!(error = %e, "Could not persist session tokens");
                }
                *self.current_tokens.write().await = Some(tokens);
                info!("Session established");
                Ok(true)
            }
            SessionCheck::NotAuthenticated => {
                *self.current_tokens.write().await = None;
                if stored.is_some() {
                    if let Err(e) = backend.store.delete().await {
                        warn!(error = %e, "Could not delete stale session tokens");
                    }
                }
                info!(landing_url = %backend.landing_url, "No session, redirecting");
                backend.navigator.redirect(&backend.landing_url);
                Ok(false)
            }
        }
    }

    /// Refresh the token if it expires within `min_validity_seconds`
    ///
    /// Does nothing in anonymous mode or without a session. A failed refresh
    /// logs the user out before the error is returned.
    ///
    /// # Errors
    /// Returns the refresh error (the session is already cleared)
    pub async fn ensure_fresh_token(&self, min_validity_seconds: i64) -> Result<(), CredentialError> {
        if self.backend.is_none() {
            return Ok(());
        }

        let observed = self.generation.load(Ordering::Acquire);
        let needs_refresh = self
            .current_tokens
            .read()
            .await
            .as_ref()
            .is_some_and(|t| t.is_expired(min_validity_seconds));

        if !needs_refresh {
            return Ok(());
        }

        debug!(min_validity_seconds, "Token expiring soon");
        self.refresh_guarded(observed).await
    }

    /// Refresh unconditionally (after the backend answered 401)
    ///
    /// # Errors
    /// Returns the refresh error (the session is already cleared)
    pub async fn force_refresh(&self) -> Result<(), CredentialError> {
        if self.backend.is_none() {
            return Err(CredentialError::NotAuthenticated);
        }

        let observed = self.generation.load(Ordering::Acquire);
        self.refresh_guarded(observed).await
    }

    async fn refresh_guarded(&self, observed: u64) -> Result<(), CredentialError> {
        let mut record = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            debug!("Reusing result of concurrent refresh");
            return record.outcome.clone();
        }

        let outcome = self.refresh_tokens().await;
        match &outcome {
            Err(CredentialError::NotAuthenticated) => debug!("No session to refresh"),
            Err(e) => {
                warn!(error = %e, "Token refresh failed, logging out");
                self.logout().await;
            }
            Ok(()) => {}
        }

        record.outcome = outcome.clone();
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    async fn refresh_tokens(&self) -> Result<(), CredentialError> {
        let Some(backend) = &self.backend else {
            return Err(CredentialError::NotAuthenticated);
        };

        let refresh_token = {
            let tokens = self.current_tokens.read().await;
            match tokens.as_ref() {
                Some(t) => t.refresh_token.clone().ok_or(CredentialError::NoRefreshToken)?,
                None => return Err(CredentialError::NotAuthenticated),
            }
        };

        let new_tokens = backend.provider.refresh(&refresh_token).await?;

        if let Err(e) = backend.store.store(&new_tokens).await {
            warn!(error = %e, "Could not persist refreshed tokens");
        }
        *self.current_tokens.write().await = Some(new_tokens);

        info!("Successfully refreshed access token");
        Ok(())
    }

    /// Clear the session and send the user to the landing page
    ///
    /// Store and provider failures are logged, never returned.
    pub async fn logout(&self) {
        let Some(backend) = &self.backend else {
            return;
        };

        let tokens = self.current_tokens.write().await.take();

        if let Err(e) = backend.store.delete().await {
            warn!(error = %e, "Could not delete stored tokens");
        }
        if let Some(tokens) = tokens {
            if let Err(e) = backend.provider.end_session(&tokens).await {
                warn!(error = %e, "Could not end provider session");
            }
        }

        info!("Tokens cleared (logged out)");
        backend.navigator.redirect(&backend.landing_url);
    }

    /// Current access token, if any (no refresh)
    pub async fn token(&self) -> Option<String> {
        self.current_tokens.read().await.as_ref().map(|t| t.access_token.clone())
    }

    /// Check if a session is held
    pub async fn is_authenticated(&self) -> bool {
        self.current_tokens.read().await.is_some()
    }

    /// Snapshot for display
    pub async fn status(&self) -> SessionStatus {
        let tokens = self.current_tokens.read().await;
        SessionStatus {
            enabled: self.is_enabled(),
            authenticated: tokens.is_some(),
            seconds_until_expiry: tokens.as_ref().and_then(TokenSet::seconds_until_expiry),
        }
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("enabled", &self.is_enabled())
            .field("generation", &self.generation.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
