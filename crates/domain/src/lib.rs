//! # SpatialBias Domain
//!
//! Data types shared by every SpatialBias crate.
//!
//! This crate contains:
//! - Operation modes and their fixed endpoint paths
//! - Typed upload records and request drafts (well-typed, not bounds-checked)
//! - Typed responses returned by the audit service
//! - Remote (HTTP 422) validation issue types
//! - Configuration structures and the crate-wide error type
//!
//! ## Architecture
//! - No dependencies on other SpatialBias crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
