//! Meter provider lifecycle
//!
//! Owns the SDK meter provider that [`UploadMetrics`] is built from. With
//! `OTEL_EXPORTER_OTLP_ENDPOINT` set, a periodic reader pushes to the collector;
//! otherwise the provider has no readers and recordings only reach the log.

use super::metrics::UploadMetrics;
use docupload_core::TelemetrySettings;
#[cfg(feature = "observability-opentelemetry")]
use opentelemetry::{metrics::MeterProvider as _, KeyValue};
#[cfg(feature = "observability-opentelemetry")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "observability-opentelemetry")]
use opentelemetry_sdk::{
    metrics::{self as sdkmetrics, PeriodicReader, SdkMeterProvider},
    Resource,
};
#[cfg(feature = "observability-opentelemetry")]
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
#[cfg(feature = "observability-opentelemetry")]
use std::time::Duration;

#[cfg(feature = "observability-opentelemetry")]
const METER_NAME: &str = "docupload";

#[derive(Clone)]
pub struct MetricsProvider {
    #[cfg(feature = "observability-opentelemetry")]
    provider: SdkMeterProvider,
}

impl MetricsProvider {
    /// Build the provider described by `settings`. Must run inside a Tokio runtime
    /// when an endpoint is configured.
    #[cfg(feature = "observability-opentelemetry")]
    pub fn from_settings(settings: &TelemetrySettings) -> anyhow::Result<Self> {
        let Some(endpoint) = settings.otlp_endpoint.as_deref() else {
            tracing::info!("OTEL_EXPORTER_OTLP_ENDPOINT not set, metrics are not exported");
            return Ok(Self::disabled());
        };

        let metric_exporter = if settings.otlp_protocol == "http" {
            opentelemetry_otlp::MetricExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .with_temporality(sdkmetrics::Temporality::Cumulative)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build HTTP metric exporter: {}", e))?
        } else {
            opentelemetry_otlp::MetricExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .with_temporality(sdkmetrics::Temporality::Cumulative)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build gRPC metric exporter: {}", e))?
        };

        let reader = PeriodicReader::builder(metric_exporter, opentelemetry_sdk::runtime::Tokio)
            .with_interval(Duration::from_secs(settings.metrics_interval_secs))
            .build();

        let resource = Resource::new(vec![
            KeyValue::new(SERVICE_NAME, settings.service_name.clone()),
            KeyValue::new(SERVICE_VERSION, settings.service_version.clone()),
        ]);

        let provider = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource)
            .build();

        tracing::info!(
            endpoint = %endpoint,
            protocol = %settings.otlp_protocol,
            interval_secs = settings.metrics_interval_secs,
            "OTLP metrics export enabled"
        );

        Ok(Self::from_sdk(provider))
    }

    #[cfg(not(feature = "observability-opentelemetry"))]
    pub fn from_settings(settings: &TelemetrySettings) -> anyhow::Result<Self> {
        if settings.otlp_endpoint.is_some() {
            tracing::warn!(
                "OTEL_EXPORTER_OTLP_ENDPOINT is set but the observability-opentelemetry feature is not enabled"
            );
        }
        Ok(Self::disabled())
    }

    /// Provider with no readers.
    pub fn disabled() -> Self {
        #[cfg(feature = "observability-opentelemetry")]
        {
            Self::from_sdk(SdkMeterProvider::builder().build())
        }
        #[cfg(not(feature = "observability-opentelemetry"))]
        {
            Self {}
        }
    }

    #[cfg(feature = "observability-opentelemetry")]
    pub fn from_sdk(provider: SdkMeterProvider) -> Self {
        Self { provider }
    }

    pub fn upload_metrics(&self, known_file_types: Vec<String>) -> UploadMetrics {
        #[cfg(feature = "observability-opentelemetry")]
        {
            UploadMetrics::new(&self.provider.meter(METER_NAME), known_file_types)
        }
        #[cfg(not(feature = "observability-opentelemetry"))]
        {
            UploadMetrics::new(known_file_types)
        }
    }

    /// Flush pending data points and stop the readers. Blocks until the final export
    /// completes, so call it off the async workers.
    pub fn shutdown(&self) -> anyhow::Result<()> {
        #[cfg(feature = "observability-opentelemetry")]
        self.provider
            .shutdown()
            .map_err(|e| anyhow::anyhow!("Failed to shut down meter provider: {}", e))?;
        Ok(())
    }
}

#[cfg(all(test, feature = "observability-opentelemetry"))]
mod tests {
    use super::*;
    use crate::telemetry::metrics::UPLOADS_TOTAL;
    use crate::telemetry::shutdown_telemetry;
    use opentelemetry_sdk::testing::metrics::InMemoryMetricExporter;

    #[tokio::test]
    async fn test_without_endpoint_is_disabled() {
        let provider = MetricsProvider::from_settings(&TelemetrySettings::default()).unwrap();
        let metrics = provider.upload_metrics(vec![".txt".to_string()]);
        metrics.record_upload(".txt", 1, Duration::from_millis(1));
        assert!(provider.shutdown().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn test_shutdown_exports_pending_metrics() {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone(), opentelemetry_sdk::runtime::Tokio)
            .with_interval(Duration::from_secs(3600))
            .build();
        let provider =
            MetricsProvider::from_sdk(SdkMeterProvider::builder().with_reader(reader).build());

        let metrics = provider.upload_metrics(vec![".txt".to_string()]);
        metrics.record_upload(".txt", 10, Duration::from_millis(3));

        shutdown_telemetry(&provider).await;

        let exported = exporter.get_finished_metrics().unwrap();
        assert!(exported
            .iter()
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .any(|m| m.name == UPLOADS_TOTAL));

        // Already shut down.
        assert!(provider.shutdown().is_err());
    }
}
