//! Bounded authentication retry
//!
//! Attempt 1 is the original request. Every further attempt is only taken
//! after a 401 and a successful forced refresh, and never beyond
//! `max_attempts`, so a backend that keeps answering 401 cannot loop.

use spatialbias_domain::constants::DEFAULT_MAX_ATTEMPTS;

use super::errors::ApiError;

/// Decision after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Force a token refresh, then replay the request
    RefreshAndRetry,
    /// Propagate the error
    Stop,
}

/// How many times one request may be sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Policy allowing `max_attempts` sends in total (at least one)
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1) }
    }

    /// Single attempt, 401 propagated as is
    pub const fn no_retry() -> Self {
        Self { max_attempts: 1 }
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what follows a failed attempt (`attempt` is 1-based)
    pub fn should_retry(&self, error: &ApiError, attempt: u32) -> RetryDecision {
        if attempt < self.max_attempts && error.is_auth_rejection() {
            RetryDecision::RefreshAndRetry
        } else {
            RetryDecision::Stop
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
