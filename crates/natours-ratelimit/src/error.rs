use thiserror::Error;

/// Rate limiting errors
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Configuration error
    #[error("rate limit configuration error: {0}")]
    Config(String),

    /// Redis connection or command error
    #[error("redis error: {0}")]
    Redis(String),

    /// Client exceeded its quota for the current window
    #[error("rate limit exceeded")]
    Exceeded {
        /// Configured ceiling
        limit: u32,
        /// Seconds until the window resets
        retry_after: u64,
    },
}
