//! Conversions from external infrastructure errors into domain errors.

use std::io::Error as IoError;

use reqwest::Error as HttpError;
use serde_json::Error as JsonError;
use spatialbias_domain::SpatialBiasError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub SpatialBiasError);

impl From<InfraError> for SpatialBiasError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SpatialBiasError> for InfraError {
    fn from(value: SpatialBiasError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoSpatialBiasError {
    fn into_spatialbias(self) -> SpatialBiasError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SpatialBiasError */
/* -------------------------------------------------------------------------- */

impl IntoSpatialBiasError for HttpError {
    fn into_spatialbias(self) -> SpatialBiasError {
        if self.is_timeout() {
            return SpatialBiasError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return SpatialBiasError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return SpatialBiasError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => SpatialBiasError::Auth(message),
                400..=499 => SpatialBiasError::InvalidInput(message),
                _ => SpatialBiasError::Network(message),
            };
        }

        SpatialBiasError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_spatialbias())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → SpatialBiasError */
/* -------------------------------------------------------------------------- */

impl IntoSpatialBiasError for IoError {
    fn into_spatialbias(self) -> SpatialBiasError {
        use std::io::ErrorKind;

        match self.kind() {
            ErrorKind::NotFound => SpatialBiasError::Config(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                SpatialBiasError::Config(format!("permission denied: {self}"))
            }
            _ => SpatialBiasError::Internal(format!("I/O error: {self}")),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_spatialbias())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml → SpatialBiasError */
/* -------------------------------------------------------------------------- */

impl IntoSpatialBiasError for JsonError {
    fn into_spatialbias(self) -> SpatialBiasError {
        if self.is_io() {
            return SpatialBiasError::Internal(format!("I/O error while reading JSON: {self}"));
        }
        SpatialBiasError::InvalidInput(format!("invalid JSON: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_spatialbias())
    }
}

impl IntoSpatialBiasError for TomlError {
    fn into_spatialbias(self) -> SpatialBiasError {
        SpatialBiasError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        InfraError(value.into_spatialbias())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
