//! Application context - dependency wiring

use std::sync::Arc;

use spatialbias_common::auth::{CredentialManager, Navigator};
use spatialbias_core::RequestOrchestrator;
use spatialbias_domain::{Config, Result, SpatialBiasError};
use spatialbias_infra::{build_credential_manager, ApiClient, ApiClientConfig};
use tracing::{info, warn};

/// Holds the session and the request pipeline for one process
pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<CredentialManager>,
    pub orchestrator: RequestOrchestrator,
}

impl AppContext {
    /// Build the context and establish the session (silent check)
    ///
    /// # Errors
    /// Returns error if the configuration is unusable or the identity
    /// provider cannot be reached
    pub async fn new(config: Config) -> Result<Self> {
        let credentials = Arc::new(build_credential_manager(&config.auth, Arc::new(LogNavigator))?);

        let authenticated = credentials
            .initialize()
            .await
            .map_err(|e| SpatialBiasError::Auth(e.to_string()))?;
        info!(authenticated, enabled = credentials.is_enabled(), "Session initialized");

        Self::with_credentials(config, credentials)
    }

    /// Build the context around an existing session
    ///
    /// # Errors
    /// Returns `SpatialBiasError::Config` if the API client cannot be built
    pub fn with_credentials(config: Config, credentials: Arc<CredentialManager>) -> Result<Self> {
        let client = ApiClient::new(ApiClientConfig::from(&config.api), credentials.clone())
            .map_err(|e| SpatialBiasError::Config(e.to_string()))?;
        let orchestrator = RequestOrchestrator::new(Arc::new(client));

        Ok(Self { config, credentials, orchestrator })
    }
}

/// Terminal stand-in for a browser redirect: reports where to sign in
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect(&self, url: &str) {
        warn!(landing_url = %url, "Not signed in, continue at the landing page");
    }
}
