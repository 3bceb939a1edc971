//! Audit service transport
//!
//! HTTP client for the five analysis endpoints. It handles bearer token
//! attachment, the forced refresh after a 401 and the bounded replay.
//!
//! # Architecture
//!
//! - Uses the shared [`HttpClient`](crate::http::HttpClient) (no direct
//!   reqwest client)
//! - Token source behind [`AccessTokenProvider`], implemented by the
//!   credential manager
//! - Explicit [`RetryPolicy`] (default: 2 attempts)
//! - Implements the core `AnalysisTransport` port

pub mod auth;
pub mod client;
pub mod errors;
pub mod retry;

pub use auth::AccessTokenProvider;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use errors::{ApiError, ApiErrorCategory};
pub use retry::{RetryDecision, RetryPolicy};
