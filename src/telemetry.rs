use anyhow::{Context, Result};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, Resource};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

/// Where and how spans are exported.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub environment: String,
    /// Spans are only exported when set.
    pub otlp_endpoint: Option<String>,
    pub export_timeout: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: env!("CARGO_PKG_NAME").to_string(),
            environment: "development".to_string(),
            otlp_endpoint: None,
            export_timeout: Duration::from_secs(10),
        }
    }
}

impl TelemetryConfig {
    /// Reads `OTEL_SERVICE_NAME` and `OTEL_EXPORTER_OTLP_ENDPOINT` on top of
    /// the application environment.
    pub fn for_app(config: &Config) -> Self {
        Self {
            service_name: std::env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| env!("CARGO_PKG_NAME").to_string()),
            environment: config.app.environment.as_str().to_string(),
            otlp_endpoint: std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|endpoint| !endpoint.trim().is_empty()),
            ..Self::default()
        }
    }
}

/// Telemetry handles for graceful shutdown
pub struct TelemetryHandles {
    exporting: bool,
}

impl TelemetryHandles {
    /// Flushes pending spans and shuts the tracer provider down
    pub async fn shutdown(self) -> Result<()> {
        if self.exporting {
            info!("Shutting down telemetry providers...");
            global::shutdown_tracer_provider();
        }
        Ok(())
    }
}

/// Install the `tracing` subscriber and, when an OTLP endpoint is configured,
/// the OpenTelemetry span exporter
pub async fn init_telemetry(config: Option<TelemetryConfig>) -> Result<TelemetryHandles> {
    let config = config.unwrap_or_default();

    setup_tracing_subscriber()?;

    info!(
        service = %config.service_name,
        environment = %config.environment,
        "Telemetry initialized"
    );

    let exporting = init_tracing(&config)?;

    Ok(TelemetryHandles { exporting })
}

fn service_resource(config: &TelemetryConfig) -> Resource {
    Resource::new([
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", config.environment.clone()),
    ])
}

/// Returns whether an exporter was installed
fn init_tracing(config: &TelemetryConfig) -> Result<bool> {
    let Some(endpoint) = &config.otlp_endpoint else {
        info!("No OTLP endpoint configured, using console-only tracing");
        return Ok(false);
    };

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint)
                .with_timeout(config.export_timeout),
        )
        .with_trace_config(
            opentelemetry_sdk::trace::Config::default()
                .with_resource(service_resource(config))
                .with_sampler(opentelemetry_sdk::trace::Sampler::AlwaysOn),
        )
        .install_batch(runtime::Tokio)
        .context("Failed to initialize OTLP tracer")?;
    global::set_tracer_provider(provider);

    info!(endpoint = %endpoint, "Distributed tracing initialized with OTLP exporter");
    Ok(true)
}

fn setup_tracing_subscriber() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into());

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}

/// Reported under `services.telemetry` by `/health`.
pub fn telemetry_health_check() -> HashMap<&'static str, bool> {
    HashMap::from([("subscriber", tracing::dispatcher::has_been_set())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_is_not_installed_without_an_endpoint() {
        let config = TelemetryConfig::default();
        assert!(!init_tracing(&config).unwrap());
    }
}
