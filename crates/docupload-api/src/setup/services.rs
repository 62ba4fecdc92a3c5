//! Service construction

use crate::services::upload::DocumentUploadService;
use crate::state::AppState;
use crate::telemetry::MetricsProvider;
use anyhow::{Context, Result};
use docupload_core::{Config, FileValidator};
use docupload_storage::Storage;
use std::sync::Arc;

pub fn initialize_services(config: Config, storage: Arc<dyn Storage>) -> Result<Arc<AppState>> {
    let metrics_provider = MetricsProvider::from_settings(&config.telemetry)
        .context("Failed to initialize metrics")?;
    let metrics = Arc::new(
        metrics_provider.upload_metrics(config.file_upload.allowed_extensions.clone()),
    );

    let validator = Arc::new(FileValidator::from_options(&config.file_upload));
    let upload_service = Arc::new(DocumentUploadService::new(
        validator,
        storage.clone(),
        metrics.clone(),
    ));

    Ok(Arc::new(AppState {
        config: Arc::new(config),
        storage,
        upload_service,
        metrics,
        metrics_provider,
    }))
}
