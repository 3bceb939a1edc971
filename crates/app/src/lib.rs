//! # SpatialBias App
//!
//! Command-line layer - argument parsing, dataset uploads and wiring.
//!
//! This crate contains:
//! - The `clap` command definitions
//! - Dataset upload parsing (JSON files into typed records)
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `common`, `core` and `infra`
//! - Only the binary prints; everything else reports through `tracing`

pub mod cli;
pub mod commands;
pub mod context;
pub mod upload;

pub use context::{AppContext, LogNavigator};
