use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderName;
use http::header::{HeaderValue, RETRY_AFTER};
use natours_core::{AppError, NatoursError};
use natours_ratelimit::{RateLimitError, RequestLimiter};

use super::{Exchange, Guard};

static RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
static RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
static RATELIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Counts requests per client under the limiter's path prefix
pub struct RateLimitGuard {
    limiter: Arc<RequestLimiter>,
}

impl RateLimitGuard {
    pub const fn new(limiter: Arc<RequestLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait]
impl Guard for RateLimitGuard {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        if !self.limiter.applies_to(exchange.path()) {
            return Ok(());
        }

        let key = exchange
            .client_ip
            .map_or_else(|| "unknown".to_owned(), |ip| ip.to_string());
        let headers = &mut exchange.response_headers;

        match self.limiter.check(&key).await {
            Ok(quota) => {
                headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(quota.limit));
                headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(quota.remaining));
                headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(quota.reset_secs()));
                Ok(())
            }
            Err(RateLimitError::Exceeded { limit, retry_after }) => {
                headers.insert(RATELIMIT_LIMIT.clone(), HeaderValue::from(limit));
                headers.insert(RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
                headers.insert(RATELIMIT_RESET.clone(), HeaderValue::from(retry_after));
                headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
                Err(AppError::too_many_requests(self.limiter.message()).into())
            }
            Err(error) => {
                tracing::error!(%error, "rate limit store unavailable");
                Err(NatoursError::internal(error))
            }
        }
    }
}
