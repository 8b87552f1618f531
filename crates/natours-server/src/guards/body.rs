use std::error::Error as _;

use async_trait::async_trait;
use axum::body::Body;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http_body_util::LengthLimitError;
use natours_config::ByteUnit;
use natours_core::{AppError, NatoursError};
use natours_sanitize::parse_nested;
use serde_json::{Map, Value};

use super::{BodyKind, Exchange, Guard, ParsedBody};

/// Buffers JSON and form bodies up to a byte ceiling
///
/// Other content types pass through unread.
pub struct BodyParser {
    limit: ByteUnit,
}

impl BodyParser {
    pub const fn new(limit: ByteUnit) -> Self {
        Self { limit }
    }

    fn too_large(&self) -> NatoursError {
        AppError::payload_too_large(self.limit.as_u64()).into()
    }
}

fn body_kind(exchange: &Exchange) -> Option<BodyKind> {
    let content_type = exchange.parts.headers.get(CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();

    if essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json")) {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}

fn declared_length(exchange: &Exchange) -> Option<u64> {
    exchange
        .parts
        .headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn is_length_limit(error: &axum::Error) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        source = cause.source();
    }
    false
}

#[async_trait]
impl Guard for BodyParser {
    fn name(&self) -> &'static str {
        "body_parser"
    }

    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        let Some(kind) = body_kind(exchange) else {
            return Ok(());
        };

        if declared_length(exchange).is_some_and(|len| len > self.limit.as_u64()) {
            return Err(self.too_large());
        }

        let body = std::mem::replace(&mut exchange.body, Body::empty());
        let raw = match axum::body::to_bytes(body, usize::try_from(self.limit.as_u64()).unwrap_or(usize::MAX)).await {
            Ok(raw) => raw,
            Err(error) if is_length_limit(&error) => return Err(self.too_large()),
            Err(error) => return Err(NatoursError::internal(error)),
        };

        let value = match kind {
            _ if raw.iter().all(u8::is_ascii_whitespace) => Value::Object(Map::new()),
            BodyKind::Json => serde_json::from_slice(&raw).map_err(|error| {
                tracing::debug!(%error, "rejecting malformed JSON body");
                AppError::bad_request("Invalid JSON body")
            })?,
            BodyKind::Form => Value::Object(parse_nested(&raw)),
        };

        exchange.parsed = Some(ParsedBody::new(kind, value, raw));
        Ok(())
    }
}
