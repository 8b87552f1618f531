use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::{Quota, error::RateLimitError};

/// Expired windows are swept after this many checks
const SWEEP_EVERY: u64 = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// In-memory fixed-window counter keyed by client
///
/// The increment and the comparison happen while the key's shard lock is
/// held, so concurrent requests from one client are never undercounted.
#[derive(Clone)]
pub struct MemoryLimiter {
    windows: Arc<DashMap<String, Window>>,
    checks: Arc<AtomicU64>,
    max_requests: u32,
    window: Duration,
}

impl MemoryLimiter {
    /// Create a new in-memory rate limiter
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests per window
    /// * `window` - Time window duration
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        if max_requests == 0 {
            return Err(RateLimitError::Config("max_requests must be > 0".to_string()));
        }
        if window.is_zero() {
            return Err(RateLimitError::Config("rate limit window must be > 0".to_string()));
        }

        Ok(Self {
            windows: Arc::new(DashMap::new()),
            checks: Arc::new(AtomicU64::new(0)),
            max_requests,
            window,
        })
    }

    /// Check if a request is allowed for the given key
    pub fn check(&self, key: &str) -> Result<Quota, RateLimitError> {
        self.check_at(key, Instant::now())
    }

    /// Check against an explicit clock reading
    pub fn check_at(&self, key: &str, now: Instant) -> Result<Quota, RateLimitError> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep(now);
        }

        let (count, elapsed) = {
            let mut entry = self.windows.entry(key.to_owned()).or_insert(Window { count: 0, started: now });
            if now.saturating_duration_since(entry.started) >= self.window {
                *entry = Window { count: 0, started: now };
            }
            entry.count = entry.count.saturating_add(1);
            (entry.count, now.saturating_duration_since(entry.started))
        };

        let quota = Quota {
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(count),
            reset_after: self.window.saturating_sub(elapsed),
        };

        if count > self.max_requests {
            return Err(RateLimitError::Exceeded {
                limit: self.max_requests,
                retry_after: quota.reset_secs(),
            });
        }

        Ok(quota)
    }

    /// Number of clients with a live window
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    fn sweep(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }
}
