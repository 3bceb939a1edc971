//! Testing utilities and helpers
//!
//! - **[`mocks`]**: In-memory implementations of the session ports
//!   (identity provider, token store, navigator)
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "test-utils")]
//! # {
//! use std::sync::Arc;
//!
//! use spatialbias_common::auth::CredentialManager;
//! use spatialbias_common::testing::{
//!     token_set, MemoryTokenStore, MockIdentityProvider, RecordingNavigator,
//! };
//!
//! let manager = CredentialManager::new(
//!     Arc::new(MockIdentityProvider::authenticated(token_set("access", 300))),
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::new(RecordingNavigator::new()),
//!     "https://example.org/",
//! );
//! assert!(manager.is_enabled());
//! # }
//! ```

pub mod mocks;

pub use mocks::{token_set, MemoryTokenStore, MockIdentityProvider, RecordingNavigator};
