//! Configuration structures
//!
//! Populated by the infra config loader from environment variables or a
//! TOML/JSON file. Authentication settings are only mandatory when
//! authentication is enabled.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MIN_TOKEN_VALIDITY_SECS,
};
use crate::errors::{Result, SpatialBiasError};

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl Config {
    /// Check cross-section requirements.
    ///
    /// # Errors
    /// Returns `SpatialBiasError::Config` when authentication is enabled but
    /// any of its settings is missing, or when the API section is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(SpatialBiasError::Config("api.base_url must not be empty".into()));
        }
        if self.api.max_attempts == 0 {
            return Err(SpatialBiasError::Config("api.max_attempts must be at least 1".into()));
        }
        if self.auth.enabled {
            self.auth.settings()?;
        }
        Ok(())
    }
}

/// Backend API settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base address of the audit service (e.g. `https://audit.example.org`)
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per request (original + retries after a 401)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Refresh the bearer token when it expires within this many seconds
    #[serde(default = "default_min_token_validity_secs")]
    pub min_token_validity_secs: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_token_validity_secs: DEFAULT_MIN_TOKEN_VALIDITY_SECS,
        }
    }
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_min_token_validity_secs() -> i64 {
    DEFAULT_MIN_TOKEN_VALIDITY_SECS
}

/// Authentication settings as read from the environment or a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Whether authentication is administratively enabled
    #[serde(default)]
    pub enabled: bool,
    /// Authentication service URL (Keycloak base URL)
    pub url: Option<String>,
    /// Realm (tenant) identifier
    pub realm: Option<String>,
    /// Public client identifier
    pub client_id: Option<String>,
    /// Where the user is sent when not authenticated or after logout
    pub landing_url: Option<String>,
    /// Token store location; defaults to `~/.spatialbias/session.json`
    pub token_store: Option<PathBuf>,
}

impl AuthConfig {
    /// Resolve the complete settings required to talk to the identity
    /// provider.
    ///
    /// # Errors
    /// Returns `SpatialBiasError::Config` naming every missing setting.
    pub fn settings(&self) -> Result<AuthSettings> {
        let mut missing = Vec::new();
        let mut take = |value: &Option<String>, name: &'static str| match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => {
                missing.push(name);
                String::new()
            }
        };

        let url = take(&self.url, "auth.url");
        let realm = take(&self.realm, "auth.realm");
        let client_id = take(&self.client_id, "auth.client_id");
        let landing_url = take(&self.landing_url, "auth.landing_url");

        if !missing.is_empty() {
            return Err(SpatialBiasError::Config(format!(
                "authentication is enabled but settings are missing: {}",
                missing.join(", ")
            )));
        }

        Ok(AuthSettings { url, realm, client_id, landing_url })
    }
}

/// Fully resolved authentication settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    pub url: String,
    pub realm: String,
    pub client_id: String,
    pub landing_url: String,
}
