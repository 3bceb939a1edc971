//! Session adapters
//!
//! Concrete implementations of the credential manager's ports:
//! - [`KeycloakProvider`]: OpenID Connect realm (silent check, refresh,
//!   end session)
//! - [`FileTokenStore`]: token set persisted as JSON between runs

pub mod keycloak;
pub mod token_store;

use std::sync::Arc;

use spatialbias_common::auth::{CredentialManager, Navigator};
use spatialbias_domain::{AuthConfig, Result, SpatialBiasError};
use tracing::debug;

pub use keycloak::KeycloakProvider;
pub use token_store::FileTokenStore;

/// Build the process credential manager from configuration
///
/// Disabled authentication yields an anonymous manager; enabled
/// authentication requires complete identity provider settings.
///
/// # Errors
/// Returns `SpatialBiasError::Config` if authentication is enabled with
/// incomplete settings or no token store location can be determined
pub fn build_credential_manager(
    auth: &AuthConfig,
    navigator: Arc<dyn Navigator>,
) -> Result<CredentialManager> {
    if !auth.enabled {
        debug!("Authentication disabled, running anonymously");
        return Ok(CredentialManager::disabled());
    }

    let settings = auth.settings()?;
    let provider = KeycloakProvider::new(&settings)?;

    let store_path = match &auth.token_store {
        Some(path) => path.clone(),
        None => FileTokenStore::default_path().ok_or_else(|| {
            SpatialBiasError::Config(
                "cannot determine home directory for the session store; set SPATIALBIAS_TOKEN_STORE"
                    .to_string(),
            )
        })?,
    };

    Ok(CredentialManager::new(
        Arc::new(provider),
        Arc::new(FileTokenStore::new(store_path)),
        navigator,
        settings.landing_url,
    ))
}
