//! Errors surfaced to the caller of the orchestrator

use spatialbias_common::validation::ValidationError;
use thiserror::Error;

use crate::ports::TransportError;

/// Failure inside the pipeline, before normalization
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineFailure {
    /// Building rejected the input
    #[error("{0}")]
    Input(String),

    /// Local contract check failed; nothing was sent
    #[error(transparent)]
    Schema(#[from] ValidationError),

    /// Sending failed (including HTTP 422)
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// The single user-facing failure of one operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Input could not be assembled into a request
    #[error("{0}")]
    Input(String),

    /// Client-side or remote validation failure, already formatted
    #[error("{0}")]
    Invalid(String),

    /// Anything else, passed through unformatted
    #[error(transparent)]
    Transport(TransportError),
}

impl AnalysisError {
    /// The underlying transport failure, if this is one
    #[must_use]
    pub const fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}
