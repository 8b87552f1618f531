use std::collections::BTreeMap;
use std::net::IpAddr;

use axum::extract::FromRequestParts;
use http::request::Parts;
use jiff::Timestamp;
use serde_json::{Map, Value};

use crate::error::NatoursError;

/// Request-scoped metadata attached once, after parsing and before dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Arrival time as an ISO-8601 UTC string with millisecond precision
    pub request_time: String,
    /// Client address used for rate limiting, if known
    pub client_ip: Option<IpAddr>,
    /// Cookies sent with the request
    pub cookies: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new(now: Timestamp, client_ip: Option<IpAddr>, cookies: BTreeMap<String, String>) -> Self {
        Self {
            request_time: format_request_time(now),
            client_ip,
            cookies,
        }
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

/// Format a timestamp like `2024-03-01T09:30:00.000Z`
pub fn format_request_time(ts: Timestamp) -> String {
    format!("{ts:.3}")
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = NatoursError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| NatoursError::internal(anyhow::anyhow!("request context was not attached")))
    }
}

/// Values dropped from repeated parameters, keyed by field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollutedParams {
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
}

impl PollutedParams {
    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.body.is_empty()
    }
}
