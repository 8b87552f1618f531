use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Outcome class of an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatus {
    /// The client sent something that cannot be served (4xx)
    Fail,
    /// The server could not serve a valid request (5xx)
    Error,
}

impl ErrorStatus {
    pub fn from_status_code(code: StatusCode) -> Self {
        if code.is_client_error() { Self::Fail } else { Self::Error }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An anticipated failure whose message is safe to show to the client
///
/// Every value is operational and immutable once built.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    message: String,
    status_code: StatusCode,
    status: ErrorStatus,
    is_operational: bool,
    id: Uuid,
    location: &'static Location<'static>,
}

impl AppError {
    /// Create an error with a client-safe message and HTTP status code
    #[track_caller]
    pub fn new(message: impl Into<String>, status_code: StatusCode) -> Self {
        Self {
            message: message.into(),
            status_code,
            status: ErrorStatus::from_status_code(status_code),
            is_operational: true,
            id: Uuid::new_v4(),
            location: Location::caller(),
        }
    }

    /// No route claimed the request
    #[track_caller]
    pub fn not_found(original_url: impl fmt::Display) -> Self {
        Self::new(format!("Can't find {original_url} on this server!"), StatusCode::NOT_FOUND)
    }

    #[track_caller]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    #[track_caller]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    #[track_caller]
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::TOO_MANY_REQUESTS)
    }

    /// Request body exceeded the configured ceiling
    #[track_caller]
    pub fn payload_too_large(limit_bytes: u64) -> Self {
        Self::new(
            format!("Request body larger than {limit_bytes} bytes"),
            StatusCode::PAYLOAD_TOO_LARGE,
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn status_code(&self) -> StatusCode {
        self.status_code
    }

    pub const fn status(&self) -> ErrorStatus {
        self.status
    }

    pub const fn is_operational(&self) -> bool {
        self.is_operational
    }

    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Source location where the error was raised
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

/// Every failure a pipeline stage or route group can propagate
#[derive(Debug, Clone, Error)]
pub enum NatoursError {
    /// Expected, user-facing failure
    #[error(transparent)]
    App(#[from] AppError),

    /// A defect: anything not raised as an `AppError`
    #[error("{message}")]
    Internal {
        message: String,
        /// Cause chain and backtrace, never sent to production clients
        trace: String,
        id: Uuid,
    },
}

impl NatoursError {
    /// Wrap an unexpected failure
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        let error = error.into();
        Self::Internal {
            message: error.to_string(),
            trace: format!("{error:?}"),
            id: Uuid::new_v4(),
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::App(e) => e.status_code(),
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn status(&self) -> ErrorStatus {
        match self {
            Self::App(e) => e.status(),
            Self::Internal { .. } => ErrorStatus::Error,
        }
    }

    pub const fn is_operational(&self) -> bool {
        match self {
            Self::App(e) => e.is_operational(),
            Self::Internal { .. } => false,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::App(e) => e.message(),
            Self::Internal { message, .. } => message,
        }
    }

    pub const fn id(&self) -> Uuid {
        match self {
            Self::App(e) => e.id(),
            Self::Internal { id, .. } => *id,
        }
    }

    /// Diagnostic trace for development responses and logs
    pub fn trace(&self) -> String {
        match self {
            Self::App(e) => format!("AppError: {}\n    at {}", e.message(), e.location()),
            Self::Internal { trace, .. } => trace.clone(),
        }
    }
}

impl From<anyhow::Error> for NatoursError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error)
    }
}

impl From<serde_json::Error> for NatoursError {
    fn from(error: serde_json::Error) -> Self {
        Self::internal(error)
    }
}

impl From<std::io::Error> for NatoursError {
    fn from(error: std::io::Error) -> Self {
        Self::internal(error)
    }
}

/// An error travelling outward on a response, awaiting the global responder
#[derive(Debug, Clone)]
pub struct ErrorReport(Arc<NatoursError>);

impl ErrorReport {
    pub fn error(&self) -> &NatoursError {
        &self.0
    }
}

impl IntoResponse for NatoursError {
    fn into_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response.extensions_mut().insert(ErrorReport(Arc::new(self)));
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        NatoursError::App(self).into_response()
    }
}
