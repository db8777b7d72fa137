//! Logging, tracing and metrics setup
//!
//! Library code only emits `tracing` events and OpenTelemetry measurements.
//! Applications that want to see them call [`init_observability`] once at
//! start-up, which installs:
//!
//! - a `tracing-subscriber` registry filtered by `RUST_LOG` (falling back to
//!   the configured level) with a JSON or human-readable fmt layer
//! - optionally, an OTLP span exporter bridged through `tracing-opentelemetry`
//! - optionally, an OTLP metrics pipeline backing `ClientMetrics`
//!
//! ```rust,no_run
//! use ariarpc_core::ObservabilityConfig;
//!
//! let config = ObservabilityConfig::new("aria2-watcher")
//!     .with_endpoint("http://localhost:4317")
//!     .with_log_level("debug");
//! ariarpc_core::init_observability(config).expect("observability");
//! // ...
//! ariarpc_core::shutdown_observability();
//! ```
//!
//! # Environment Variables
//!
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: collector endpoint
//! - `RUST_LOG`: log filter (e.g. `ariarpc_client=debug`)

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

static TRACER_PROVIDER: Mutex<Option<SdkTracerProvider>> = Mutex::new(None);
static METER_PROVIDER: Mutex<Option<SdkMeterProvider>> = Mutex::new(None);

/// Observability settings
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub service_name: String,
    pub service_version: String,
    pub otlp_endpoint: String,
    pub enable_traces: bool,
    pub enable_metrics: bool,
    /// Emit JSON log lines instead of the compact human format
    pub json_logs: bool,
    pub log_level: String,
    pub metrics_interval: Duration,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "ariarpc".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .unwrap_or_else(|_| "http://localhost:4317".to_string()),
            enable_traces: true,
            enable_metrics: true,
            json_logs: true,
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            metrics_interval: Duration::from_secs(30),
        }
    }
}

impl ObservabilityConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Logs only, no OTLP export
    pub fn logs_only(service_name: impl Into<String>) -> Self {
        Self::new(service_name).with_traces(false).with_metrics(false)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.otlp_endpoint = endpoint.into();
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_traces(mut self, enable: bool) -> Self {
        self.enable_traces = enable;
        self
    }

    pub fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    pub fn with_json_logs(mut self, enable: bool) -> Self {
        self.json_logs = enable;
        self
    }

    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes(vec![
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                    self.service_name.clone(),
                ),
                KeyValue::new(
                    opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                    self.service_version.clone(),
                ),
            ])
            .build()
    }
}

/// Install the global subscriber and, if enabled, the OTLP pipelines
///
/// Fails if a global subscriber is already installed.
pub fn init_observability(config: ObservabilityConfig) -> Result<(), BoxError> {
    let tracer = if config.enable_traces {
        Some(init_tracer(&config)?)
    } else {
        None
    };

    if config.enable_metrics {
        init_metrics(&config)?;
    }

    init_tracing_subscriber(&config, tracer)?;

    tracing::info!(
        service_name = %config.service_name,
        otlp_endpoint = %config.otlp_endpoint,
        traces = config.enable_traces,
        metrics = config.enable_metrics,
        "observability initialized"
    );

    Ok(())
}

fn init_tracer(config: &ObservabilityConfig) -> Result<opentelemetry_sdk::trace::Tracer, BoxError> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler};

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(config.resource())
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .build();

    let tracer = provider.tracer(config.service_name.clone());
    global::set_tracer_provider(provider.clone());
    if let Ok(mut slot) = TRACER_PROVIDER.lock() {
        *slot = Some(provider);
    }

    Ok(tracer)
}

fn init_metrics(config: &ObservabilityConfig) -> Result<(), BoxError> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .build()?;

    let reader = opentelemetry_sdk::metrics::PeriodicReader::builder(exporter)
        .with_interval(config.metrics_interval)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(config.resource())
        .build();

    global::set_meter_provider(provider.clone());
    if let Ok(mut slot) = METER_PROVIDER.lock() {
        *slot = Some(provider);
    }

    Ok(())
}

fn init_tracing_subscriber(
    config: &ObservabilityConfig,
    tracer: Option<opentelemetry_sdk::trace::Tracer>,
) -> Result<(), BoxError> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let telemetry_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    let json_layer = config.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .json()
    });
    let text_layer = (!config.json_logs).then(|| tracing_subscriber::fmt::layer().compact());

    tracing_subscriber::registry()
        .with(telemetry_layer)
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    Ok(())
}

/// Flush and stop the OTLP pipelines
///
/// Safe to call more than once and when nothing was initialized.
pub fn shutdown_observability() {
    let tracer = TRACER_PROVIDER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(provider) = tracer {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "tracer provider shutdown failed");
        }
    }

    let meter = METER_PROVIDER.lock().ok().and_then(|mut slot| slot.take());
    if let Some(provider) = meter {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "meter provider shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.service_name, "ariarpc");
        assert!(config.enable_traces);
        assert!(config.enable_metrics);
        assert!(config.json_logs);
        assert_eq!(config.metrics_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_custom_config() {
        let config = ObservabilityConfig::new("aria2-watcher")
            .with_endpoint("http://collector:4317")
            .with_log_level("debug")
            .with_version("1.0.0")
            .with_json_logs(false)
            .with_metrics_interval(Duration::from_secs(5))
            .with_traces(false);

        assert_eq!(config.service_name, "aria2-watcher");
        assert_eq!(config.otlp_endpoint, "http://collector:4317");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.service_version, "1.0.0");
        assert!(!config.json_logs);
        assert_eq!(config.metrics_interval, Duration::from_secs(5));
        assert!(!config.enable_traces);
    }

    #[test]
    fn test_logs_only() {
        let config = ObservabilityConfig::logs_only("quiet");
        assert!(!config.enable_traces);
        assert!(!config.enable_metrics);
    }

    #[test]
    fn test_init_logs_only_then_second_init_fails() {
        let first = init_observability(ObservabilityConfig::logs_only("test").with_log_level("warn"));
        assert!(first.is_ok());

        let second = init_observability(ObservabilityConfig::logs_only("test"));
        assert!(second.is_err());
    }

    #[test]
    fn test_shutdown_without_init() {
        shutdown_observability();
        shutdown_observability();
    }
}
