use std::collections::HashMap;

use serde::Deserialize;
use url::Url;

/// Logging and trace export configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Service name for telemetry metadata
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// `tracing` filter directive (e.g. `info,natours_server=debug`)
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Log line format
    #[serde(default)]
    pub log_format: LogFormat,
    /// Additional resource attributes attached to exported spans
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
    /// OTLP trace exporter, disabled when absent
    #[serde(default)]
    pub exporter: Option<ExporterConfig>,
    /// Fraction of traces to sample (0.0 to 1.0)
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            resource_attributes: HashMap::new(),
            exporter: None,
            sampling_rate: default_sampling_rate(),
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// OTLP exporter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    /// OTLP endpoint URL
    pub endpoint: Url,
    /// Export protocol
    #[serde(default)]
    pub protocol: ExportProtocol,
}

/// OTLP export protocol
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportProtocol {
    /// gRPC (default)
    #[default]
    Grpc,
    /// HTTP/protobuf
    HttpProto,
}

fn default_service_name() -> String {
    "natours".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_sampling_rate() -> f64 {
    1.0
}
