//! Shared types for the Natours request pipeline
//!
//! The error types here are the only channel through which a stage reports a
//! failure; the server's global responder is the only place that turns them
//! into a response body.

mod context;
mod error;

pub use context::{PollutedParams, RequestContext};
pub use error::{AppError, ErrorReport, ErrorStatus, NatoursError};
