//! In-memory doubles for the session ports.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{
    CredentialError, IdentityProvider, Navigator, SessionCheck, TokenSet, TokenStore,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Token set with access token `access`, refresh token `refresh-<access>`
/// and `expires_in` seconds left.
#[must_use]
pub fn token_set(access: &str, expires_in: i64) -> TokenSet {
    TokenSet::new(
        access.to_string(),
        Some(format!("refresh-{access}")),
        Some(format!("id-{access}")),
        expires_in,
        Some("openid".to_string()),
    )
}

/// Identity provider with scripted answers and call counters
#[derive(Debug)]
pub struct MockIdentityProvider {
    check_result: Mutex<SessionCheck>,
    check_error: Mutex<Option<String>>,
    refresh_fails: AtomicBool,
    refresh_lifetime: Mutex<i64>,
    refresh_delay: Option<Duration>,
    refresh_calls: AtomicUsize,
    end_session_calls: AtomicUsize,
}

impl MockIdentityProvider {
    fn with_check(check: SessionCheck) -> Self {
        Self {
            check_result: Mutex::new(check),
            check_error: Mutex::new(None),
            refresh_fails: AtomicBool::new(false),
            refresh_lifetime: Mutex::new(300),
            refresh_delay: None,
            refresh_calls: AtomicUsize::new(0),
            end_session_calls: AtomicUsize::new(0),
        }
    }

    /// Silent check succeeds with `tokens`
    pub fn authenticated(tokens: TokenSet) -> Self {
        Self::with_check(SessionCheck::Authenticated(tokens))
    }

    /// Silent check finds no session
    pub fn not_authenticated() -> Self {
        Self::with_check(SessionCheck::NotAuthenticated)
    }

    /// Delay every refresh, to keep it in flight while others queue
    #[must_use]
    pub const fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    /// Make the silent check fail with a provider error
    pub fn fail_check(&self, message: &str) {
        *lock(&self.check_error) = Some(message.to_string());
    }

    /// Make every following refresh fail with `invalid_grant`
    pub fn fail_refresh(&self) {
        self.refresh_fails.store(true, Ordering::SeqCst);
    }

    /// Lifetime of refreshed tokens (default 300s)
    pub fn set_refresh_lifetime(&self, seconds: i64) {
        *lock(&self.refresh_lifetime) = seconds;
    }

    /// Number of refresh calls so far
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of end-session calls so far
    #[must_use]
    pub fn end_session_calls(&self) -> usize {
        self.end_session_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn check_session(
        &self,
        _stored: Option<&TokenSet>,
    ) -> Result<SessionCheck, CredentialError> {
        if let Some(message) = lock(&self.check_error).clone() {
            return Err(CredentialError::Provider(message));
        }
        Ok(lock(&self.check_result).clone())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenSet, CredentialError> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }

        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(CredentialError::InvalidGrant("Token is not active".to_string()));
        }

        let lifetime = *lock(&self.refresh_lifetime);
        Ok(token_set(&format!("refreshed-{n}"), lifetime))
    }

    async fn end_session(&self, _tokens: &TokenSet) -> Result<(), CredentialError> {
        self.end_session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Token store kept in memory
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenSet>>,
}

impl MemoryTokenStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `tokens`
    #[must_use]
    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self { tokens: Mutex::new(Some(tokens)) }
    }

    /// Currently stored token set
    #[must_use]
    pub fn current(&self) -> Option<TokenSet> {
        lock(&self.tokens).clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store(&self, tokens: &TokenSet) -> Result<(), CredentialError> {
        *lock(&self.tokens) = Some(tokens.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<TokenSet>, CredentialError> {
        Ok(self.current())
    }

    async fn delete(&self) -> Result<(), CredentialError> {
        *lock(&self.tokens) = None;
        Ok(())
    }
}

/// Navigator that records every redirect
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect targets in call order
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        lock(&self.redirects).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, url: &str) {
        lock(&self.redirects).push(url.to_string());
    }
}
