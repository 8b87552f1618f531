//! Logging and trace export for Natours
//!
//! Log lines go to stdout through `tracing-subscriber`; spans are exported
//! over OTLP when an exporter is configured.

mod metadata;

use natours_config::TelemetryConfig;
use natours_config::telemetry::{ExportProtocol, ExporterConfig, LogFormat};
use opentelemetry::global;
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps exporters alive; flushes pending spans on drop
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("failed to shutdown tracer provider: {e}");
        }
    }
}

/// Initialize the global subscriber
///
/// `log_filter` overrides the configured filter when given. Returns a guard
/// that must be held for the lifetime of the application.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or a global subscriber
/// is already installed
pub fn init(config: Option<&TelemetryConfig>, log_filter: Option<&str>) -> anyhow::Result<TelemetryGuard> {
    let defaults = TelemetryConfig::default();
    let config = config.unwrap_or(&defaults);

    let directive = log_filter.unwrap_or(&config.log_filter);
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let text_layer = (config.log_format == LogFormat::Text).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
    });
    let json_layer = (config.log_format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
    });

    let tracer_provider = config
        .exporter
        .as_ref()
        .map(|exporter| init_tracer(config, exporter))
        .transpose()?;

    let otel_layer = tracer_provider.as_ref().map(|provider| {
        global::set_tracer_provider(provider.clone());
        tracing_opentelemetry::layer().with_tracer(provider.tracer("natours"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(TelemetryGuard { tracer_provider })
}

fn sampler(rate: f64) -> Sampler {
    let sampler = if rate >= 1.0 {
        Sampler::AlwaysOn
    } else if rate <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(rate)
    };
    Sampler::ParentBased(Box::new(sampler))
}

fn init_tracer(config: &TelemetryConfig, exporter: &ExporterConfig) -> anyhow::Result<SdkTracerProvider> {
    use opentelemetry_otlp::SpanExporter;

    let span_exporter = match exporter.protocol {
        ExportProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(exporter.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build gRPC span exporter: {e}"))?,
        ExportProtocol::HttpProto => SpanExporter::builder()
            .with_http()
            .with_endpoint(exporter.endpoint.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP span exporter: {e}"))?,
    };

    Ok(SdkTracerProvider::builder()
        .with_resource(metadata::build_resource(config))
        .with_sampler(sampler(config.sampling_rate))
        .with_batch_exporter(span_exporter)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_bounds() {
        assert!(matches!(sampler(1.0), Sampler::ParentBased(_)));
        assert!(format!("{:?}", sampler(0.0)).contains("AlwaysOff"));
        assert!(format!("{:?}", sampler(0.25)).contains("TraceIdRatioBased"));
    }

    #[test]
    fn second_init_is_an_error() {
        let first = init(None, Some("warn"));
        assert!(first.is_ok());
        assert!(init(None, None).is_err());
    }
}
