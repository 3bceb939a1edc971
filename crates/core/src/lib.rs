//! # SpatialBias Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The contract registry (one request/response contract pair per mode)
//! - The request orchestrator (`Building -> Validating -> Sending`)
//! - The error normalizer
//! - The transport port implemented by infra
//!
//! ## Architecture Principles
//! - Only depends on `spatialbias-common` and `spatialbias-domain`
//! - No HTTP or filesystem code
//! - The network is reached only through [`AnalysisTransport`]

pub mod contracts;
pub mod errors;
pub mod normalizer;
pub mod orchestrator;
pub mod ports;

pub use contracts::{
    advanced_defaults, http_validation_error_contract, request_contract, response_contract,
    validation_issue_contract,
};
pub use errors::{AnalysisError, PipelineFailure};
pub use normalizer::{format_client_error, format_remote_issues, normalize};
pub use orchestrator::{RequestOrchestrator, Stage, MISSING_THRESHOLD_INPUTS};
pub use ports::{AnalysisTransport, TransportError};
