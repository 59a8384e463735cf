//! Distributed tracing over OTLP.

use crate::config::TracingSettings;
use crate::{Error, Result};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{Protocol, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Registry;

use super::otlp::{OtlpConfig, OtlpProtocol, endpoint_from};

const DEFAULT_TRACE_SAMPLE_RATIO: f64 = 1.0;

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Whether span export is enabled.
    pub enabled: bool,
    /// OTLP exporter configuration.
    pub otlp: OtlpConfig,
    /// Sample ratio for trace sampling (0.0 - 1.0).
    pub sample_ratio: f64,
    /// Service name for telemetry.
    pub service_name: String,
}

impl TracingConfig {
    /// Builds tracing configuration from config settings with env overrides.
    #[must_use]
    pub fn from_settings(settings: Option<&TracingSettings>) -> Self {
        Self::from_settings_with(settings, |key| std::env::var(key).ok())
    }

    /// Builds tracing configuration, reading overrides through `lookup`.
    ///
    /// Export turns on by itself when an endpoint is present unless
    /// explicitly disabled.
    #[must_use]
    pub fn from_settings_with(
        settings: Option<&TracingSettings>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let otlp = OtlpConfig::from_settings_with(settings, &lookup);

        let enabled = lookup("CLIMARISK_TRACING_ENABLED")
            .map(|value| matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
            .or_else(|| settings.and_then(|config| config.enabled))
            .unwrap_or_else(|| otlp.endpoint.is_some() || endpoint_from(&lookup).is_some());

        let sample_ratio = lookup("CLIMARISK_TRACE_SAMPLE_RATIO")
            .or_else(|| lookup("OTEL_TRACES_SAMPLER_ARG"))
            .and_then(|value| value.trim().parse::<f64>().ok())
            .or_else(|| settings.and_then(|config| config.sample_ratio))
            .unwrap_or(DEFAULT_TRACE_SAMPLE_RATIO)
            .clamp(0.0, 1.0);

        let service_name = lookup("OTEL_SERVICE_NAME")
            .or_else(|| settings.and_then(|config| config.service_name.clone()))
            .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());

        Self {
            enabled,
            otlp,
            sample_ratio,
            service_name,
        }
    }
}

/// Tracing initialization output.
pub struct TracingInit {
    /// `OpenTelemetry` layer for the subscriber.
    pub layer: OpenTelemetryLayer<Registry, opentelemetry_sdk::trace::Tracer>,
    /// Tracer provider for shutdown flushing.
    pub provider: SdkTracerProvider,
}

/// Builds the tracing layer and provider, or `None` when export is disabled.
///
/// # Errors
///
/// Returns an error if export is enabled without an endpoint or the exporter
/// cannot be built.
pub fn build_tracing(config: &TracingConfig) -> Result<Option<TracingInit>> {
    if !config.enabled {
        return Ok(None);
    }

    let endpoint = config.otlp.endpoint.clone().ok_or_else(|| {
        Error::failed("tracing_init", "OTLP endpoint required when tracing is enabled")
    })?;

    let exporter = match config.otlp.protocol {
        OtlpProtocol::Grpc => SpanExporter::builder()
            .with_tonic()
            .with_endpoint(&endpoint)
            .build(),
        OtlpProtocol::Http => SpanExporter::builder()
            .with_http()
            .with_protocol(Protocol::HttpBinary)
            .with_endpoint(&endpoint)
            .build(),
    }
    .map_err(|e| Error::failed("otlp_exporter_build", e))?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", config.service_name.clone()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();
    let provider = SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            config.sample_ratio,
        ))))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build();

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(provider.clone());

    let tracer = provider.tracer(config.service_name.clone());
    Ok(Some(TracingInit {
        layer: OpenTelemetryLayer::new(tracer),
        provider,
    }))
}
