use std::time::Duration;

use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;

use crate::{Quota, error::RateLimitError};

/// Redis-backed fixed-window counter shared between server instances
pub struct RedisLimiter {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    key_prefix: String,
    max_requests: u32,
    window: Duration,
}

impl RedisLimiter {
    /// Create a new Redis-backed rate limiter
    ///
    /// The connection is opened on first use and reconnects on its own.
    pub fn new(url: &str, key_prefix: &str, max_requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        if max_requests == 0 {
            return Err(RateLimitError::Config("max_requests must be > 0".to_string()));
        }

        let client =
            redis::Client::open(url).map_err(|e| RateLimitError::Redis(format!("failed to connect to Redis: {e}")))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            key_prefix: key_prefix.to_owned(),
            max_requests,
            window,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, RateLimitError> {
        self.connection
            .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
            .await
            .cloned()
            .map_err(|e| RateLimitError::Redis(format!("failed to get connection: {e}")))
    }

    fn rate_key(&self, key: &str) -> String {
        format!("{}:{key}", self.key_prefix)
    }

    fn window_secs(&self) -> u64 {
        self.window.as_secs().max(1)
    }

    /// Check if a request is allowed for the given key
    pub async fn check(&self, key: &str) -> Result<Quota, RateLimitError> {
        use redis::AsyncCommands;

        let mut conn = self.connection().await?;
        let rate_key = self.rate_key(key);
        let window_secs = self.window_secs();

        let (count, ttl): (u32, i64) = redis::pipe()
            .atomic()
            .incr(&rate_key, 1)
            .ttl(&rate_key)
            .query_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Redis(format!("INCR failed: {e}")))?;

        // A key without expiry is either new or lost its EXPIRE; either way
        // the window starts now
        let reset_secs = match reset_after(ttl) {
            Some(secs) => secs,
            None => {
                let _: () = conn
                    .expire(&rate_key, i64::try_from(window_secs).unwrap_or(i64::MAX))
                    .await
                    .map_err(|e| RateLimitError::Redis(format!("EXPIRE failed: {e}")))?;
                if count > 1 {
                    tracing::warn!(key = %rate_key, count, "restored missing expiry on rate limit key");
                }
                window_secs
            }
        };

        quota(count, self.max_requests, reset_secs)
    }
}

/// Seconds left on a key from its `TTL` reply, `None` when it has no expiry
fn reset_after(ttl: i64) -> Option<u64> {
    u64::try_from(ttl).ok().map(|secs| secs.max(1))
}

fn quota(count: u32, max_requests: u32, reset_secs: u64) -> Result<Quota, RateLimitError> {
    if count > max_requests {
        return Err(RateLimitError::Exceeded {
            limit: max_requests,
            retry_after: reset_secs,
        });
    }

    Ok(Quota {
        limit: max_requests,
        remaining: max_requests - count,
        reset_after: Duration::from_secs(reset_secs),
    })
}
