//! Integration tests for the credential manager
//!
//! Drives the session through a full lifecycle with the in-memory doubles.

use std::sync::Arc;

use spatialbias_common::auth::{CredentialError, CredentialManager};
use spatialbias_common::testing::{
    token_set, MemoryTokenStore, MockIdentityProvider, RecordingNavigator,
};

const LANDING: &str = "https://spatialbias.example.org/";

/// Test the lifecycle: initialize, refresh near expiry, force refresh, logout
#[tokio::test]
async fn test_session_lifecycle() {
    let provider = Arc::new(MockIdentityProvider::authenticated(token_set("initial", 20)));
    let store = Arc::new(MemoryTokenStore::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let manager =
        CredentialManager::new(provider.clone(), store.clone(), navigator.clone(), LANDING);

    assert!(manager.initialize().await.expect("initialize"));
    assert_eq!(manager.token().await.as_deref(), Some("initial"));

    // 20s left is inside the 30s window
    manager.ensure_fresh_token(30).await.expect("refresh");
    assert_eq!(manager.token().await.as_deref(), Some("refreshed-1"));

    // 300s left is outside it
    manager.ensure_fresh_token(30).await.expect("no refresh");
    assert_eq!(provider.refresh_calls(), 1);

    manager.force_refresh().await.expect("forced refresh");
    assert_eq!(manager.token().await.as_deref(), Some("refreshed-2"));
    assert_eq!(store.current().map(|t| t.access_token), Some("refreshed-2".to_string()));

    manager.logout().await;
    assert!(!manager.is_authenticated().await);
    assert!(store.current().is_none());
    assert_eq!(provider.end_session_calls(), 1);
    assert_eq!(navigator.redirects(), vec![LANDING.to_string()]);
}

/// Test that a session dropped by the provider ends in a single redirect
#[tokio::test]
async fn test_rejected_refresh_ends_session() {
    let provider = Arc::new(MockIdentityProvider::authenticated(token_set("initial", 3600)));
    let navigator = Arc::new(RecordingNavigator::new());
    let manager = CredentialManager::new(
        provider.clone(),
        Arc::new(MemoryTokenStore::new()),
        navigator.clone(),
        LANDING,
    );
    manager.initialize().await.expect("initialize");

    provider.fail_refresh();
    let err = manager.force_refresh().await.unwrap_err();

    assert!(matches!(err, CredentialError::InvalidGrant(_)));
    assert!(manager.token().await.is_none());
    assert_eq!(navigator.redirects().len(), 1);

    // Without a session there is nothing left to refresh
    manager.ensure_fresh_token(30).await.expect("no-op without session");
    assert_eq!(provider.refresh_calls(), 1);
}

/// Test refreshes that hand out short-lived tokens
#[tokio::test]
async fn test_short_lived_refreshed_token_refreshes_again() {
    let provider = Arc::new(MockIdentityProvider::authenticated(token_set("initial", 5)));
    provider.set_refresh_lifetime(5);
    let manager = CredentialManager::new(
        provider.clone(),
        Arc::new(MemoryTokenStore::new()),
        Arc::new(RecordingNavigator::new()),
        LANDING,
    );
    manager.initialize().await.expect("initialize");

    manager.ensure_fresh_token(30).await.expect("first");
    manager.ensure_fresh_token(30).await.expect("second");

    assert_eq!(provider.refresh_calls(), 2);
    assert_eq!(manager.token().await.as_deref(), Some("refreshed-2"));
}
