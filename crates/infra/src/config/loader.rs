//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `SPATIALBIAS_API_BASE_URL` is not set, falls back to a file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. Without either, runs anonymously against `http://localhost:8000`
//!
//! ## Environment Variables
//! - `SPATIALBIAS_API_BASE_URL`: Audit service base URL
//! - `SPATIALBIAS_API_TIMEOUT_SECS`: Per-request timeout (default 120)
//! - `SPATIALBIAS_MAX_ATTEMPTS`: Attempts per request incl. the 401 replay
//!   (default 2)
//! - `SPATIALBIAS_MIN_TOKEN_VALIDITY_SECS`: Outbound refresh threshold
//!   (default 30)
//! - `SPATIALBIAS_AUTH_ENABLED`: Whether authentication is enabled
//!   (true/false)
//! - `SPATIALBIAS_AUTH_URL`, `SPATIALBIAS_AUTH_REALM`,
//!   `SPATIALBIAS_AUTH_CLIENT_ID`, `SPATIALBIAS_LANDING_URL`: identity
//!   provider settings, only read when authentication is enabled
//! - `SPATIALBIAS_TOKEN_STORE`: Token store file path
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./spatialbias.toml` or `./spatialbias.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. `~/.spatialbias/config.toml` or `~/.spatialbias/config.json`
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use spatialbias_domain::{ApiConfig, AuthConfig, Config, Result, SpatialBiasError};

use crate::errors::InfraError;

/// Base URL variable; its presence selects environment configuration
pub const ENV_API_BASE_URL: &str = "SPATIALBIAS_API_BASE_URL";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables, then from a config
/// file, and finally falls back to defaults (authentication disabled).
///
/// # Errors
/// Returns `SpatialBiasError::Config` if:
/// - An environment variable or file has an invalid value
/// - Authentication is enabled with incomplete settings
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::info!("No configuration found, using defaults");
                    Config::default()
                }
            }
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `SPATIALBIAS_API_BASE_URL` must be present. With authentication disabled
/// the identity provider variables are not read.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `SpatialBiasError::Config` if the base URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let base_url = env_var(ENV_API_BASE_URL)?;
    let defaults = ApiConfig::default();

    let api = ApiConfig {
        base_url,
        timeout_secs: env_parse("SPATIALBIAS_API_TIMEOUT_SECS", defaults.timeout_secs)?,
        max_attempts: env_parse("SPATIALBIAS_MAX_ATTEMPTS", defaults.max_attempts)?,
        min_token_validity_secs: env_parse(
            "SPATIALBIAS_MIN_TOKEN_VALIDITY_SECS",
            defaults.min_token_validity_secs,
        )?,
    };

    let enabled = env_bool("SPATIALBIAS_AUTH_ENABLED", false);
    let auth = if enabled {
        AuthConfig {
            enabled,
            url: env_opt("SPATIALBIAS_AUTH_URL"),
            realm: env_opt("SPATIALBIAS_AUTH_REALM"),
            client_id: env_opt("SPATIALBIAS_AUTH_CLIENT_ID"),
            landing_url: env_opt("SPATIALBIAS_LANDING_URL"),
            token_store: env_opt("SPATIALBIAS_TOKEN_STORE").map(PathBuf::from),
        }
    } else {
        AuthConfig::default()
    };

    Ok(Config { api, auth })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `SpatialBiasError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SpatialBiasError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SpatialBiasError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SpatialBiasError::from(InfraError::from(e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `SpatialBiasError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| SpatialBiasError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SpatialBiasError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SpatialBiasError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("spatialbias.toml"),
            cwd.join("spatialbias.json"),
            cwd.join("config.toml"),
            cwd.join("config.json"),
        ]);
    }

    if let Some(dir) = home_dir().map(|home| home.join(".spatialbias")) {
        candidates.extend(vec![dir.join("config.toml"), dir.join("config.json")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("spatialbias.toml"),
                exe_dir.join("spatialbias.json"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// User home directory from `HOME` (or `USERPROFILE` on Windows)
pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

/// Get required environment variable
///
/// # Errors
/// Returns `SpatialBiasError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SpatialBiasError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional, non-empty environment variable
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable, using `default` when unset
///
/// # Errors
/// Returns `SpatialBiasError::Config` if the value cannot be parsed.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| SpatialBiasError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
///
/// # Returns
/// The parsed boolean value, or `default` if not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
