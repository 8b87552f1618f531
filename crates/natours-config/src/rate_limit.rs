use std::time::Duration;

use serde::Deserialize;
use url::Url;

/// Request rate limiting for a path prefix, keyed by client address
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Storage backend
    #[serde(default)]
    pub storage: RateLimitStorage,
    /// Maximum requests per client per window
    #[serde(default = "default_requests")]
    pub requests: u32,
    /// Window duration (e.g. "15m", "1h")
    #[serde(default = "default_window")]
    pub window: String,
    /// Only paths under this prefix are counted
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Message returned once the ceiling is exceeded
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage: RateLimitStorage::default(),
            requests: default_requests(),
            window: default_window(),
            path_prefix: default_path_prefix(),
            message: default_message(),
        }
    }
}

impl RateLimitConfig {
    /// Parse the configured window
    ///
    /// # Errors
    ///
    /// Returns an error if the window is not a valid duration or is zero
    pub fn window_duration(&self) -> anyhow::Result<Duration> {
        let window = duration_str::parse(&self.window)
            .map_err(|e| anyhow::anyhow!("invalid rate limit window '{}': {e}", self.window))?;

        if window.is_zero() {
            anyhow::bail!("rate limit window must be greater than zero");
        }

        Ok(window)
    }
}

/// Rate limit storage backend
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RateLimitStorage {
    /// In-memory storage (single instance only)
    #[default]
    Memory,
    /// Redis-backed storage (shared between instances)
    Redis(RedisConfig),
}

/// Redis configuration for rate limiting
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: Url,
    /// Key prefix for counters
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_requests() -> u32 {
    100
}

fn default_window() -> String {
    "1h".to_string()
}

fn default_path_prefix() -> String {
    "/api".to_string()
}

fn default_message() -> String {
    "Too many requests from this IP, please try again in an hour!".to_string()
}

fn default_key_prefix() -> String {
    "natours:ratelimit".to_string()
}
