use natours_config::{RateLimitConfig, RateLimitStorage};

use crate::{
    Quota,
    error::RateLimitError,
    storage::{memory::MemoryLimiter, redis::RedisLimiter},
};

/// Per-client request limiter for a path prefix
pub struct RequestLimiter {
    limiter: Limiter,
    path_prefix: String,
    message: String,
}

enum Limiter {
    Memory(MemoryLimiter),
    Redis(RedisLimiter),
}

impl RequestLimiter {
    /// Create from configuration
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let window = config
            .window_duration()
            .map_err(|e| RateLimitError::Config(e.to_string()))?;

        let limiter = match &config.storage {
            RateLimitStorage::Memory => Limiter::Memory(MemoryLimiter::new(config.requests, window)?),
            RateLimitStorage::Redis(redis_config) => Limiter::Redis(RedisLimiter::new(
                redis_config.url.as_str(),
                &redis_config.key_prefix,
                config.requests,
                window,
            )?),
        };

        Ok(Self {
            limiter,
            path_prefix: config.path_prefix.trim_end_matches('/').to_owned(),
            message: config.message.clone(),
        })
    }

    /// Whether requests to `path` count against the limit
    pub fn applies_to(&self, path: &str) -> bool {
        self.path_prefix.is_empty()
            || path == self.path_prefix
            || path
                .strip_prefix(self.path_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Message returned to clients that exceed the limit
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record a request for `client` and check it against the ceiling
    pub async fn check(&self, client: &str) -> Result<Quota, RateLimitError> {
        let result = match &self.limiter {
            Limiter::Memory(m) => m.check(client),
            Limiter::Redis(r) => r.check(client).await,
        };

        if let Err(RateLimitError::Exceeded { retry_after, .. }) = &result {
            tracing::debug!(client, retry_after, "rate limit exceeded");
        }

        result
    }
}
