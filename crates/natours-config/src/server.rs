use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use ubyte::ByteUnit;

use crate::{
    client_ip::ClientIpConfig, cors::CorsConfig, environment::Environment, health::HealthConfig,
    rate_limit::RateLimitConfig, sanitize::ParameterPollutionConfig, sanitize::SanitizeConfig,
    security::SecurityHeadersConfig,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    #[serde(default)]
    pub environment: Environment,
    /// Directory of static assets served before the not-found fallback
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Ceiling for JSON and form bodies
    ///
    /// Accepts an integer byte count or a unit string. Decimal units are
    /// powers of 1000, so write `"10KiB"` for 10240 bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit: ByteUnit,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub security_headers: SecurityHeadersConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub sanitize: SanitizeConfig,
    #[serde(default)]
    pub parameter_pollution: ParameterPollutionConfig,
    #[serde(default)]
    pub client_ip: ClientIpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: None,
            environment: Environment::default(),
            static_dir: None,
            body_limit: default_body_limit(),
            health: HealthConfig::default(),
            security_headers: SecurityHeadersConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            sanitize: SanitizeConfig::default(),
            parameter_pollution: ParameterPollutionConfig::default(),
            client_ip: ClientIpConfig::default(),
        }
    }
}

const fn default_body_limit() -> ByteUnit {
    ByteUnit::Kibibyte(10)
}
