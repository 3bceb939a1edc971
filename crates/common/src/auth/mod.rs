//! Session and credential management
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  CredentialManager  │  Session lifecycle + guarded refresh
//! └─────────┬───────────┘
//!           │
//!           ├──► IdentityProvider  (silent check, refresh, end session)
//!           ├──► TokenStore        (persistence between runs)
//!           └──► Navigator         (landing page redirect)
//! ```
//!
//! The concrete OpenID Connect provider and file store live in the infra
//! crate; [`crate::testing`] has in-memory doubles.
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenSet`, token endpoint payloads, session snapshots
//! - **[`traits`]**: the three ports
//! - **[`credential_manager`]**: the session object

pub mod credential_manager;
pub mod traits;
pub mod types;

pub use credential_manager::{CredentialError, CredentialManager};
pub use traits::{IdentityProvider, Navigator, TokenStore};
pub use types::{OAuthError, SessionCheck, SessionStatus, TokenResponse, TokenSet};
