//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for SpatialBias
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SpatialBiasError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for SpatialBias operations
pub type Result<T> = std::result::Result<T, SpatialBiasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_category() {
        let err = SpatialBiasError::Config("SPATIALBIAS_AUTH_REALM missing".into());
        assert_eq!(err.to_string(), "Configuration error: SPATIALBIAS_AUTH_REALM missing");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = SpatialBiasError::Auth("refresh rejected".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "refresh rejected");
    }
}
