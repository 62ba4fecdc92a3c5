use super::provider::MetricsProvider;
use docupload_core::{LogFormat, TelemetrySettings};
use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "docupload=debug,docupload_api=debug,docupload_storage=debug,tower_http=debug";

/// Initialize tracing.
///
/// `RUST_LOG` overrides the default filter. Calling this more than once (as tests do)
/// leaves the first subscriber in place.
pub fn init_telemetry(settings: &TelemetrySettings) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = match settings.log_format {
        LogFormat::Compact => {
            // Console: compact format (message string for convenience).
            let console_fmt = tracing_subscriber::fmt::layer().event_format(
                Format::default()
                    .compact()
                    .with_target(false)
                    .without_time(),
            );
            tracing_subscriber::registry()
                .with(filter)
                .with(console_fmt)
                .try_init()
        }
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init(),
    };

    match result {
        Ok(()) => {
            tracing::info!(
                service_name = %settings.service_name,
                service_version = %settings.service_version,
                log_format = ?settings.log_format,
                "Tracing initialized"
            );
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Tracing subscriber already installed");
            Ok(())
        }
    }
}

/// Flush and stop the meter provider. The final export runs on the blocking pool.
pub async fn shutdown_telemetry(metrics: &MetricsProvider) {
    tracing::info!("Shutting down telemetry...");

    let metrics = metrics.clone();
    match tokio::task::spawn_blocking(move || metrics.shutdown()).await {
        Ok(Ok(())) => tracing::info!("Telemetry shutdown complete"),
        Ok(Err(e)) => tracing::warn!(error = %e, "Telemetry shutdown failed"),
        Err(e) => tracing::warn!(error = %e, "Telemetry shutdown task failed"),
    }
}
