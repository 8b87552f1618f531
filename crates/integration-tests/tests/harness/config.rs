//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::PathBuf;

use natours_config::{AnyOrArray, Config, CorsConfig, Environment, ServerConfig};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Reference configuration bound to a random local port
    pub fn new() -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    ..ServerConfig::default()
                },
                telemetry: None,
            },
        }
    }

    pub fn production(mut self) -> Self {
        self.config.server.environment = Environment::Production;
        self
    }

    /// Lower the request ceiling so tests can exhaust it quickly
    pub fn with_request_limit(mut self, requests: u32) -> Self {
        self.config.server.rate_limit.requests = requests;
        self
    }

    /// Only accept the given browser origins
    pub fn with_origins(mut self, origins: &[&str]) -> Self {
        self.config.server.cors = CorsConfig {
            origins: AnyOrArray::List(origins.iter().map(|o| (*o).to_owned()).collect()),
            ..CorsConfig::default()
        };
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.server.static_dir = Some(dir.into());
        self
    }

    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
