//! Ordered request guards
//!
//! Each guard sees the same [`Exchange`] in turn and either lets it continue
//! or short-circuits with an error. The chain stops at the first error; the
//! route handler only runs once every guard has passed.

mod body;
mod client_ip;
mod origin;
mod pollution;
mod rate_limit;
mod request_time;
mod sanitize;

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{CONTENT_LENGTH, HeaderValue};
use http::request::Parts;
use http::{HeaderMap, Uri};
use natours_config::{AnyOrArray, ServerConfig};
use natours_core::NatoursError;
use natours_ratelimit::RequestLimiter;
use natours_sanitize::{encode_nested, parse_nested};
use serde_json::{Map, Value};

pub use body::BodyParser;
pub use origin::OriginGuard;
pub use pollution::PollutionGuard;
pub use rate_limit::RateLimitGuard;
pub use request_time::RequestTime;
pub use sanitize::{InjectionSanitizer, MarkupSanitizer};

/// A request-processing stage that may transform or reject a request
#[async_trait]
pub trait Guard: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Inspect or rewrite the exchange, or reject it
    async fn apply(&self, exchange: &mut Exchange) -> Result<(), NatoursError>;
}

/// Encoding of a parsed request body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
}

/// A buffered body and its structured form
#[derive(Debug)]
pub struct ParsedBody {
    pub kind: BodyKind,
    pub value: Value,
    raw: axum::body::Bytes,
    dirty: bool,
}

impl ParsedBody {
    pub(crate) const fn new(kind: BodyKind, value: Value, raw: axum::body::Bytes) -> Self {
        Self {
            kind,
            value,
            raw,
            dirty: false,
        }
    }

    /// Record that `value` no longer matches the bytes received
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn into_bytes(self) -> Result<axum::body::Bytes, NatoursError> {
        if !self.dirty {
            return Ok(self.raw);
        }

        match (self.kind, self.value) {
            (BodyKind::Json, value) => Ok(serde_json::to_vec(&value)?.into()),
            (BodyKind::Form, Value::Object(map)) => Ok(encode_nested(&map).into()),
            (BodyKind::Form, other) => Err(NatoursError::internal(anyhow::anyhow!(
                "form body is not an object: {other}"
            ))),
        }
    }
}

/// A request in flight through the guard chain
pub struct Exchange {
    pub parts: Parts,
    /// Unread body, taken by the body parser
    pub body: Body,
    pub parsed: Option<ParsedBody>,
    /// Query string parsed with bracket nesting
    pub query: Map<String, Value>,
    query_dirty: bool,
    pub client_ip: Option<IpAddr>,
    /// Headers copied onto whatever response the request ends with
    pub response_headers: HeaderMap,
}

impl Exchange {
    pub fn new(request: Request, trusted_hops: Option<usize>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts
            .uri
            .query()
            .map(|q| parse_nested(q.as_bytes()))
            .unwrap_or_default();
        let client_ip = client_ip::resolve(&parts, trusted_hops);

        Self {
            parts,
            body,
            parsed: None,
            query,
            query_dirty: false,
            client_ip,
            response_headers: HeaderMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Record that `query` no longer matches the request URI
    pub fn mark_query_dirty(&mut self) {
        self.query_dirty = true;
    }

    /// Reassemble the request, re-encoding whatever the guards rewrote
    pub fn into_request(self) -> Result<Request, NatoursError> {
        let Self {
            mut parts,
            body,
            parsed,
            query,
            query_dirty,
            ..
        } = self;

        if query_dirty {
            parts.uri = rewrite_query(&parts.uri, &query)?;
        }

        let body = match parsed {
            Some(parsed) => {
                let bytes = parsed.into_bytes()?;
                parts.headers.insert(CONTENT_LENGTH, HeaderValue::from(bytes.len()));
                Body::from(bytes)
            }
            None => body,
        };

        Ok(Request::from_parts(parts, body))
    }
}

fn rewrite_query(uri: &Uri, query: &Map<String, Value>) -> Result<Uri, NatoursError> {
    let encoded = encode_nested(query);
    let path_and_query = if encoded.is_empty() {
        uri.path().to_owned()
    } else {
        format!("{}?{encoded}", uri.path())
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(path_and_query.parse().map_err(NatoursError::internal)?);
    Uri::from_parts(uri_parts).map_err(NatoursError::internal)
}

/// The ordered list of guards applied to every request
pub struct GuardChain {
    guards: Vec<Box<dyn Guard>>,
    trusted_hops: Option<usize>,
}

impl GuardChain {
    pub fn new(trusted_hops: Option<usize>) -> Self {
        Self {
            guards: Vec::new(),
            trusted_hops,
        }
    }

    /// Append a guard; guards run in insertion order
    #[must_use]
    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Box::new(guard));
        self
    }

    /// Build the reference chain from server configuration
    pub fn from_config(config: &ServerConfig, limiter: Option<Arc<RequestLimiter>>) -> Self {
        let mut chain = Self::new(config.client_ip.trusted_hops);

        if config.cors.enabled
            && let AnyOrArray::List(ref origins) = config.cors.origins
        {
            chain = chain.with(OriginGuard::new(origins.clone()));
        }

        if let Some(limiter) = limiter {
            chain = chain.with(RateLimitGuard::new(limiter));
        }

        chain = chain.with(BodyParser::new(config.body_limit));

        if config.sanitize.injection {
            chain = chain.with(InjectionSanitizer::new(config.sanitize.replace_with.clone()));
        }

        if config.sanitize.markup {
            chain = chain.with(MarkupSanitizer);
        }

        if config.parameter_pollution.enabled {
            chain = chain.with(PollutionGuard::new(config.parameter_pollution.whitelist.clone()));
        }

        chain.with(RequestTime)
    }

    /// Names of the guards in execution order
    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Run every guard in order, stopping at the first rejection
    pub async fn run(&self, exchange: &mut Exchange) -> Result<(), NatoursError> {
        for guard in &self.guards {
            if let Err(error) = guard.apply(exchange).await {
                tracing::debug!(
                    guard = guard.name(),
                    path = exchange.path(),
                    status = error.status_code().as_u16(),
                    "request rejected"
                );
                return Err(error);
            }
        }
        Ok(())
    }
}

/// Middleware that runs the guard chain before handing the request on
pub async fn guard_chain_middleware(chain: Arc<GuardChain>, request: Request, next: Next) -> Response {
    let mut exchange = Exchange::new(request, chain.trusted_hops);

    let outcome = chain.run(&mut exchange).await;
    let extra_headers = std::mem::take(&mut exchange.response_headers);

    let mut response = match outcome.and_then(|()| exchange.into_request()) {
        Ok(request) => next.run(request).await,
        Err(error) => error.into_response(),
    };

    for (name, value) in &extra_headers {
        response.headers_mut().insert(name.clone(), value.clone());
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::routing::post;
    use http::StatusCode;
    use natours_core::{AppError, ErrorReport};
    use tower::ServiceExt;

    use super::*;

    struct Reject;

    #[async_trait]
    impl Guard for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        async fn apply(&self, _exchange: &mut Exchange) -> Result<(), NatoursError> {
            Err(AppError::forbidden("stop here").into())
        }
    }

    struct Panics;

    #[async_trait]
    impl Guard for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        async fn apply(&self, _exchange: &mut Exchange) -> Result<(), NatoursError> {
            panic!("guards after a rejection must not run");
        }
    }

    fn app(chain: GuardChain) -> Router {
        let chain = Arc::new(chain);
        Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .layer(axum::middleware::from_fn(move |req, next| {
                let chain = Arc::clone(&chain);
                async move { guard_chain_middleware(chain, req, next).await }
            }))
    }

    #[tokio::test]
    async fn first_rejection_short_circuits() {
        let router = app(GuardChain::new(None).with(Reject).with(Panics));

        let response = router
            .oneshot(http::Request::post("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.error().message(), "stop here");
    }

    #[tokio::test]
    async fn untouched_body_reaches_handler_verbatim() {
        let router = app(GuardChain::new(None).with(BodyParser::new(natours_config::ByteUnit::Kibibyte(10))));
        let raw = "{ \"name\" :  \"The Park Camper\" }";

        let response = router
            .oneshot(
                http::Request::post("/echo")
                    .header("content-type", "application/json")
                    .body(Body::from(raw))
                    .unwrap(),
            )
            .await
            .unwrap();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes, raw.as_bytes());
    }

    #[test]
    fn reference_chain_order() {
        let config = ServerConfig {
            cors: natours_config::CorsConfig {
                origins: AnyOrArray::List(vec!["https://natours.dev".to_owned()]),
                ..natours_config::CorsConfig::default()
            },
            ..ServerConfig::default()
        };
        let limiter = Arc::new(RequestLimiter::new(&config.rate_limit).unwrap());

        let chain = GuardChain::from_config(&config, Some(limiter));
        assert_eq!(
            chain.names(),
            [
                "origin",
                "rate_limit",
                "body_parser",
                "injection_sanitizer",
                "markup_sanitizer",
                "parameter_pollution",
                "request_time"
            ]
        );
    }

    #[test]
    fn rewritten_query_is_reencoded() {
        let request = http::Request::get("/api/v1/tours?sort=price&sort=duration").body(Body::empty()).unwrap();
        let mut exchange = Exchange::new(request, None);
        exchange.query.insert("sort".to_owned(), Value::String("duration".to_owned()));
        exchange.mark_query_dirty();

        let request = exchange.into_request().unwrap();
        assert_eq!(request.uri(), "/api/v1/tours?sort=duration");
    }
}
