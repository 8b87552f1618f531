#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod error;
mod request;
pub mod storage;

use std::time::Duration;

pub use error::RateLimitError;
pub use request::RequestLimiter;

use natours_config::RateLimitConfig;

/// Remaining allowance for a client in its current window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Ceiling per window
    pub limit: u32,
    /// Requests left before the ceiling is hit
    pub remaining: u32,
    /// Time until the window resets
    pub reset_after: Duration,
}

impl Quota {
    /// Whole seconds until reset, rounded up and at least 1
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        let rounded = if self.reset_after.subsec_nanos() > 0 { secs + 1 } else { secs };
        rounded.max(1)
    }
}

/// Create a request limiter from configuration
pub fn create_request_limiter(config: &RateLimitConfig) -> Result<RequestLimiter, RateLimitError> {
    RequestLimiter::new(config)
}
