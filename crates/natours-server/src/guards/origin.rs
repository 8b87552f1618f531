use async_trait::async_trait;
use http::header::ORIGIN;
use natours_core::{AppError, NatoursError};

use super::{Exchange, Guard};

/// Rejects cross-origin requests from origins outside the allow-list
///
/// Requests without an `Origin` header (same-origin navigation, curl) pass.
pub struct OriginGuard {
    allowed: Vec<String>,
}

impl OriginGuard {
    pub const fn new(allowed: Vec<String>) -> Self {
        Self { allowed }
    }
}

#[async_trait]
impl Guard for OriginGuard {
    fn name(&self) -> &'static str {
        "origin"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        let Some(origin) = exchange.parts.headers.get(ORIGIN) else {
            return Ok(());
        };

        let allowed = origin
            .to_str()
            .is_ok_and(|origin| self.allowed.iter().any(|a| a == origin));

        if allowed {
            Ok(())
        } else {
            Err(AppError::forbidden("Not allowed by CORS").into())
        }
    }
}
