//! The single place where failures become client-visible bodies
//!
//! Every stage signals failure by returning a bodiless response that carries
//! an [`ErrorReport`]. The responder middleware sits outside the whole stack,
//! picks the report off the response and renders the body for the configured
//! environment: full detail in development, sanitized output in production.

use std::any::Any;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use natours_config::Environment;
use natours_core::{AppError, ErrorReport, ErrorStatus, NatoursError};
use serde_json::json;

const GENERIC_MESSAGE: &str = "Something went very wrong!";
const GENERIC_PAGE_MESSAGE: &str = "Please try again later.";
/// Most of an unreported failure body that is read for its message
const MAX_DETAIL_BYTES: usize = 4096;

/// Renders error responses for one environment
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponder {
    environment: Environment,
}

impl ErrorResponder {
    pub const fn new(environment: Environment) -> Self {
        Self { environment }
    }

    /// Log the error and build its response
    pub fn render(&self, error: &NatoursError, html: bool) -> Response {
        if error.is_operational() {
            tracing::debug!(
                error_id = %error.id(),
                status = error.status_code().as_u16(),
                message = error.message(),
                "request failed"
            );
        } else {
            tracing::error!(
                error_id = %error.id(),
                message = error.message(),
                trace = %error.trace(),
                "unexpected error"
            );
        }

        match (self.environment, html) {
            (Environment::Development, false) => development_json(error),
            (Environment::Development, true) => page(error.status_code(), error.message()),
            (Environment::Production, false) => production_json(error),
            (Environment::Production, true) if error.is_operational() => {
                page(error.status_code(), error.message())
            }
            (Environment::Production, true) => page(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_PAGE_MESSAGE),
        }
    }
}

fn development_json(error: &NatoursError) -> Response {
    let body = json!({
        "status": error.status(),
        "error": {
            "statusCode": error.status_code().as_u16(),
            "status": error.status(),
            "isOperational": error.is_operational(),
            "message": error.message(),
        },
        "message": error.message(),
        "stack": error.trace(),
        "errorId": error.id(),
    });
    (error.status_code(), Json(body)).into_response()
}

fn production_json(error: &NatoursError) -> Response {
    if error.is_operational() {
        let body = json!({ "status": error.status(), "message": error.message() });
        return (error.status_code(), Json(body)).into_response();
    }

    let body = json!({ "status": ErrorStatus::Error, "message": GENERIC_MESSAGE });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Something went wrong!</title>\n</head>\n<body>\n<main class=\"error\">\n\
         <h2 class=\"error__title\">Uh oh! Something went wrong!</h2>\n\
         <div class=\"error__msg\">{}</div>\n</main>\n</body>\n</html>\n",
        escape_html(message)
    );
    (status, Html(body)).into_response()
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Whether the error for this request should be an HTML page
fn wants_html(path: &str, headers: &HeaderMap) -> bool {
    if path == "/api" || path.starts_with("/api/") {
        return false;
    }

    headers
        .get_all(ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("text/html"))
}

/// Middleware that renders any [`ErrorReport`] produced further in
///
/// Failure responses built without a report, such as extractor rejections,
/// are rendered too so no stage's own error text reaches the client.
pub async fn error_responder_middleware(responder: Arc<ErrorResponder>, request: Request, next: Next) -> Response {
    let html = wants_html(request.uri().path(), request.headers());
    let (mut parts, body) = next.run(request).await.into_parts();

    let error = match parts.extensions.remove::<ErrorReport>() {
        Some(report) => report.error().clone(),
        None if parts.status.is_client_error() || parts.status.is_server_error() => {
            unreported(parts.status, body, responder.environment).await
        }
        None => return Response::from_parts(parts, body),
    };

    let rendered = responder.render(&error, html);

    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(CONTENT_LENGTH);
    let (rendered_parts, body) = rendered.into_parts();
    parts.status = rendered_parts.status;
    parts.headers.extend(rendered_parts.headers);

    Response::from_parts(parts, body)
}

/// Error for a failure response that carried no report
///
/// Client errors stay operational. Their own body text is only shown in
/// development; production gets the status reason.
async fn unreported(status: StatusCode, body: Body, environment: Environment) -> NatoursError {
    let detail = axum::body::to_bytes(body, MAX_DETAIL_BYTES)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_owned())
        .filter(|text| !text.is_empty());
    let reason = status.canonical_reason().unwrap_or("Request failed");

    if status.is_server_error() {
        return NatoursError::internal(anyhow::anyhow!("{status}: {}", detail.as_deref().unwrap_or(reason)));
    }

    let message = match (environment, detail) {
        (Environment::Development, Some(detail)) => detail,
        _ => reason.to_owned(),
    };
    AppError::new(message, status).into()
}

/// Turn a caught panic into a defect for the responder
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    NatoursError::internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
