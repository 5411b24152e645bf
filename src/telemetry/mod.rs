//! Telemetry bootstrap
//!
//! Installs the process-wide `tracing` subscriber and, when enabled, the
//! OpenTelemetry tracer and logger providers:
//!
//! ```text
//! tracing spans  ─► tracing-opentelemetry ─► SdkTracerProvider ─► batch ─► OTLP/gRPC
//! tracing events ─► appender-tracing      ─► SdkLoggerProvider ─► batch ─► OTLP/gRPC
//!                └► fmt layer (stdout)
//! ```
//!
//! Export is batched on SDK background threads, so an unreachable collector
//! never slows down or fails a request.

pub mod http;
pub mod propagation;

use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    logs::SdkLoggerProvider, propagation::TraceContextPropagator, trace::SdkTracerProvider,
    Resource,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{ServerConfig, TelemetryConfig};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Targets kept out of OTLP export: the exporter's own transport would
/// otherwise emit spans and logs about every export it performs.
const EXPORT_EXCLUDED_TARGETS: &[&str] = &["hyper", "h2", "tonic", "tower", "opentelemetry"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Telemetry has already been initialized for this process")]
    AlreadyInitialized,
    #[error("Failed to build OTLP exporter: {0}")]
    Exporter(String),
    #[error("Invalid log filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Owns the providers installed by [`init`]; call [`TelemetryGuard::shutdown`]
/// before exit to flush buffered spans and logs.
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    pub fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }

    /// Flush and stop both providers. Blocks while the exporters drain.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Tracer provider shutdown failed");
            }
        }
        if let Some(provider) = self.logger_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Logger provider shutdown failed");
            }
        }
    }
}

/// Whether [`init`] has already run in this process
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

/// Resource descriptor attached to every span and log record
pub fn build_resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", config.service_version.clone()))
        .build()
}

/// Install logging and, if `telemetry.enabled`, OTLP trace and log export
///
/// Must run once per process, before the first instrumented call. Later calls
/// return [`TelemetryError::AlreadyInitialized`] and change nothing.
pub fn init(
    telemetry: &TelemetryConfig,
    server: &ServerConfig,
) -> Result<TelemetryGuard, TelemetryError> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TelemetryError::AlreadyInitialized);
    }

    let result = install(telemetry, server);
    if result.is_err() {
        INITIALIZED.store(false, Ordering::SeqCst);
    }
    result
}

/// Per-layer filter for the OTLP span layer and log bridge
fn export_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    let mut filter = EnvFilter::try_new(log_level)?;
    for target in EXPORT_EXCLUDED_TARGETS {
        filter = filter.add_directive(format!("{}=off", target).parse()?);
    }
    Ok(filter)
}

fn install(
    telemetry: &TelemetryConfig,
    server: &ServerConfig,
) -> Result<TelemetryGuard, TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))?;

    let (text_layer, json_layer) = if server.log_format == "json" {
        (None, Some(fmt::layer().json().with_target(true)))
    } else {
        (Some(fmt::layer().with_target(true)), None)
    };

    if !telemetry.enabled {
        tracing_subscriber::registry()
            .with(filter)
            .with(text_layer)
            .with(json_layer)
            .try_init()?;

        tracing::info!("OpenTelemetry export disabled, logging to console only");
        return Ok(TelemetryGuard::default());
    }

    let resource = build_resource(telemetry);

    let span_exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(telemetry.otlp_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_resource(resource.clone())
        .with_batch_exporter(span_exporter)
        .build();

    let log_exporter = LogExporter::builder()
        .with_tonic()
        .with_endpoint(telemetry.otlp_endpoint.clone())
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let logger_provider = SdkLoggerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(log_exporter)
        .build();

    let tracer = tracer_provider.tracer(telemetry.service_name.clone());
    let trace_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(export_filter(&server.log_level)?);

    let log_bridge = OpenTelemetryTracingBridge::new(&logger_provider)
        .with_filter(export_filter(&server.log_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(trace_layer)
        .with(log_bridge)
        .try_init()?;

    global::set_text_map_propagator(TraceContextPropagator::new());
    global::set_tracer_provider(tracer_provider.clone());

    tracing::info!(
        service.name = %telemetry.service_name,
        service.version = %telemetry.service_version,
        endpoint = %telemetry.otlp_endpoint,
        "OpenTelemetry trace and log export initialized"
    );

    Ok(TelemetryGuard {
        tracer_provider: Some(tracer_provider),
        logger_provider: Some(logger_provider),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::Value;
    use std::sync::{atomic::AtomicUsize, Arc};
    use tracing::{span, Subscriber};
    use tracing_subscriber::{layer::Context, registry::LookupSpan, Layer};

    struct CountSpans(Arc<AtomicUsize>);

    impl<S> Layer<S> for CountSpans
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(&self, _: &span::Attributes<'_>, _: &span::Id, _: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_export_filter_drops_transport_spans() {
        let seen = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry()
            .with(CountSpans(seen.clone()).with_filter(export_filter("trace").unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            let _h2 = tracing::info_span!(target: "h2::proto", "send_frame").entered();
            let _tonic = tracing::info_span!(target: "tonic::transport", "connect").entered();
            let _hyper = tracing::debug_span!(target: "hyper::client", "request").entered();
            let _query = tracing::info_span!("db.query").entered();
        });

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_export_filter_rejects_bad_level() {
        assert!(matches!(
            export_filter("not a [valid directive"),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[test]
    fn test_resource_carries_service_identity() {
        let config = TelemetryConfig {
            service_name: "users-api".to_string(),
            service_version: "1.2.3".to_string(),
            ..TelemetryConfig::default()
        };
        let resource = build_resource(&config);

        assert_eq!(
            resource.get(&"service.name".into()),
            Some(Value::from("users-api"))
        );
        assert_eq!(
            resource.get(&"service.version".into()),
            Some(Value::from("1.2.3"))
        );
    }

    // The only test in this binary that installs the global subscriber
    #[test]
    fn test_second_init_is_rejected() {
        let telemetry = TelemetryConfig {
            enabled: false,
            ..TelemetryConfig::default()
        };
        let server = ServerConfig::default();

        let guard = init(&telemetry, &server).unwrap();
        assert!(!guard.is_exporting());
        assert!(is_initialized());

        let second = init(&telemetry, &server);
        assert!(matches!(second, Err(TelemetryError::AlreadyInitialized)));
        guard.shutdown();
    }
}
