//! Document upload service
//!
//! Sequences validation and storage for a single upload, timing the whole run and
//! reporting the outcome to [`UploadMetrics`].

use std::sync::Arc;
use std::time::Instant;

use docupload_core::{AppError, UploadResponse, Validate};
use docupload_storage::{CancellationToken, Storage};

use super::types::UploadRequest;
use crate::telemetry::metrics::UploadMetrics;

const SAVE_FAILED_MESSAGE: &str = "Failed to save the uploaded file.";

pub struct DocumentUploadService {
    validator: Arc<dyn Validate>,
    storage: Arc<dyn Storage>,
    metrics: Arc<UploadMetrics>,
}

impl DocumentUploadService {
    pub fn new(
        validator: Arc<dyn Validate>,
        storage: Arc<dyn Storage>,
        metrics: Arc<UploadMetrics>,
    ) -> Self {
        Self {
            validator,
            storage,
            metrics,
        }
    }

    /// Validate the file, then store it.
    ///
    /// Validation failures become `AppError::Validation` carrying every violated rule.
    /// Storage failures (including cancellation) become `AppError::InternalWithSource`
    /// with the storage error as source.
    pub async fn upload(
        &self,
        request: UploadRequest,
        cancel: &CancellationToken,
    ) -> Result<UploadResponse, AppError> {
        let started = Instant::now();
        let file_type = request.file_type();
        let file_name = request.file.metadata.file_name.clone();

        let validation = self.validator.validate(Some(&request.file.metadata));
        if !validation.is_valid() {
            let message = validation.messages().join("; ");
            self.metrics
                .record_validation_error(&file_type, validation.errors());
            tracing::warn!(
                file_name = %file_name,
                errors = %message,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "File validation failed"
            );
            return Err(AppError::Validation(format!(
                "File validation failed: {}",
                message
            )));
        }

        let UploadRequest { file, description } = request;
        match self
            .storage
            .save(file, description.as_deref(), cancel)
            .await
        {
            Ok(response) => {
                let elapsed = started.elapsed();
                self.metrics
                    .record_upload(&file_type, response.file_size, elapsed);
                tracing::info!(
                    file_id = %response.id,
                    file_name = %response.file_name,
                    original_file_name = %response.original_file_name,
                    file_size = response.file_size,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Document uploaded"
                );
                Ok(response)
            }
            Err(e) => {
                self.metrics.record_upload_error(&file_type, e.kind());
                tracing::error!(
                    error = %e,
                    file_name = %file_name,
                    backend = self.storage.backend_name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Failed to save uploaded file"
                );
                Err(AppError::InternalWithSource {
                    message: SAVE_FAILED_MESSAGE.to_string(),
                    source: anyhow::Error::new(e),
                })
            }
        }
    }
}
