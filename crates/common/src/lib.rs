//! Common engines shared across SpatialBias crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: contract validation (no I/O, no async)
//! - `runtime`: session management on tokio (credential manager and ports)
//! - `test-utils`: in-memory doubles for the session ports
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod validation;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod auth;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use auth::{CredentialError, CredentialManager, TokenSet};
#[cfg(feature = "foundation")]
pub use validation::{
    render_path, CollectionValidator, Contract, FieldError, FieldSpec, FieldType,
    FieldValidator, IssueCode, Openness, PathSegment, Presence, RangeValidator,
    ValidationError, ValidationResult, Validator,
};
