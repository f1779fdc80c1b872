//! Tracing subscriber setup.

use billfold_error::ConfigError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging and tracing settings.
///
/// ```toml
/// [observability]
/// service_name = "billfold"
/// log_level = "info"
/// json_logs = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "billfold=debug")
    pub log_level: String,
    /// Enable JSON-formatted logs for structured logging
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Create a new configuration with the given service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Initialize tracing with default configuration.
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber is
/// already installed.
pub fn init_observability() -> Result<(), ConfigError> {
    init_observability_with_config(&ObservabilityConfig::default())
}

/// Initialize tracing with custom configuration.
///
/// This sets up:
/// - An `EnvFilter` from `RUST_LOG`, falling back to `log_level`
/// - A text or JSON fmt layer
/// - With the `otel` feature, an OpenTelemetry layer exporting spans to stdout
///
/// # Errors
///
/// Returns an error if the log filter is invalid or a global subscriber is
/// already installed.
pub fn init_observability_with_config(config: &ObservabilityConfig) -> Result<(), ConfigError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ConfigError::new(format!("Invalid log filter '{}': {}", config.log_level, e)))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let registry = tracing_subscriber::registry().with(env_filter).with(fmt_layer);

    #[cfg(feature = "otel")]
    let registry = registry.with(otel::layer(config));

    registry
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))
}

/// Runs `f` under a temporary stderr subscriber.
///
/// Covers work done before the configured subscriber can be installed, such
/// as loading the configuration itself. The filter comes from `RUST_LOG`,
/// falling back to `log_level`.
pub fn with_bootstrap_logging<T>(log_level: &str, f: impl FnOnce() -> T) -> T {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr),
    );

    tracing::subscriber::with_default(subscriber, f)
}

/// Shutdown observability gracefully.
///
/// Providers flush on drop in OpenTelemetry SDK v0.31+, so this only exists
/// for symmetry with [`init_observability`].
pub fn shutdown_observability() {}

#[cfg(feature = "otel")]
mod otel {
    use super::ObservabilityConfig;
    use opentelemetry::{KeyValue, global, trace::TracerProvider};
    use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
    use opentelemetry_stdout::SpanExporter;
    use tracing_subscriber::{Layer, registry::LookupSpan};

    /// OpenTelemetry bridge layer with a stdout span exporter.
    pub(super) fn layer<S>(config: &ObservabilityConfig) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'span> LookupSpan<'span> + Send + Sync + 'static,
    {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes(vec![KeyValue::new(
                "service.version",
                config.service_version.clone(),
            )])
            .build();

        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(SpanExporter::default())
            .with_resource(resource)
            .build();

        global::set_tracer_provider(provider.clone());

        let tracer = provider.tracer(config.service_name.clone());
        tracing_opentelemetry::layer().with_tracer(tracer).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn bootstrap_logging_is_scoped_to_the_closure() {
        let inside = with_bootstrap_logging("debug", || tracing::enabled!(Level::ERROR));
        assert!(inside);
        assert!(!tracing::enabled!(Level::ERROR));
        assert_eq!(with_bootstrap_logging("warn", || 7), 7);
    }
}
