#![allow(clippy::must_use_candidate)]

pub mod client_ip;
pub mod cors;
pub mod environment;
mod env;
pub mod health;
mod loader;
pub mod rate_limit;
pub mod sanitize;
pub mod security;
pub mod server;
pub mod telemetry;

use serde::Deserialize;

pub use client_ip::*;
pub use cors::*;
pub use environment::*;
pub use health::*;
pub use rate_limit::*;
pub use sanitize::*;
pub use security::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use ubyte::{ByteUnit, ToByteUnit};

/// Top-level Natours configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server and request pipeline configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging and trace export
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
