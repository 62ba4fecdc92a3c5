//! Application state shared by all handlers.

use crate::services::upload::DocumentUploadService;
use crate::telemetry::metrics::UploadMetrics;
use crate::telemetry::MetricsProvider;
use docupload_core::Config;
use docupload_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn Storage>,
    pub upload_service: Arc<DocumentUploadService>,
    pub metrics: Arc<UploadMetrics>,
    pub metrics_provider: MetricsProvider,
}
