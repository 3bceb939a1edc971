//! # SpatialBias Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The audit service HTTP transport (bearer attachment, 401 replay)
//! - Keycloak identity provider and file token store for the session
//! - Configuration loading (environment, TOML/JSON files)
//!
//! ## Architecture
//! - Implements traits defined in `spatialbias-core` and
//!   `spatialbias-common`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiClientBuilder, ApiClientConfig, ApiError, RetryPolicy};
pub use auth::{build_credential_manager, FileTokenStore, KeycloakProvider};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
