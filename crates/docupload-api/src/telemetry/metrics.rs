//! Upload metrics
//!
//! Instruments for the upload pipeline, created from an explicitly constructed meter
//! (see [`MetricsProvider`](super::provider::MetricsProvider)). Every recording is
//! also emitted as a structured event under the `docupload::metrics` target, which is
//! all that remains when the `observability-opentelemetry` feature is off.
//!
//! Label values are bounded. File types outside the configured allow-list collapse to
//! [`OTHER_FILE_TYPE`] and validation failures are labelled by rule kind, never by
//! message text.

use docupload_core::ValidationError;
#[cfg(feature = "observability-opentelemetry")]
use opentelemetry::{
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

pub const UPLOADS_TOTAL: &str = "document_uploads_total";
pub const UPLOAD_ERRORS_TOTAL: &str = "document_upload_errors_total";
pub const UPLOAD_DURATION: &str = "document_upload_duration";
pub const UPLOAD_SIZE_BYTES: &str = "document_upload_size_bytes";

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";
pub const STATUS_VALIDATION_FAILED: &str = "validation_failed";

/// Label used for any file type not in the allow-list.
pub const OTHER_FILE_TYPE: &str = "other";

pub struct UploadMetrics {
    known_file_types: Vec<String>,
    #[cfg(feature = "observability-opentelemetry")]
    uploads: Counter<u64>,
    #[cfg(feature = "observability-opentelemetry")]
    errors: Counter<u64>,
    #[cfg(feature = "observability-opentelemetry")]
    duration: Histogram<f64>,
    #[cfg(feature = "observability-opentelemetry")]
    size: Counter<u64>,
}

impl UploadMetrics {
    /// `known_file_types` are the lowercased extensions that get their own label.
    #[cfg(feature = "observability-opentelemetry")]
    pub fn new(meter: &Meter, known_file_types: Vec<String>) -> Self {
        let uploads = meter
            .u64_counter(UPLOADS_TOTAL)
            .with_description("Total number of documents stored")
            .build();

        let errors = meter
            .u64_counter(UPLOAD_ERRORS_TOTAL)
            .with_description("Total number of failed uploads (validation and storage)")
            .build();

        let duration = meter
            .f64_histogram(UPLOAD_DURATION)
            .with_description("Time to validate and store a document in milliseconds")
            .with_unit("ms")
            .build();

        let size = meter
            .u64_counter(UPLOAD_SIZE_BYTES)
            .with_description("Total size of stored documents")
            .with_unit("By")
            .build();

        Self {
            known_file_types,
            uploads,
            errors,
            duration,
            size,
        }
    }

    #[cfg(not(feature = "observability-opentelemetry"))]
    pub fn new(known_file_types: Vec<String>) -> Self {
        Self { known_file_types }
    }

    /// Bounded label for a lowercased extension.
    pub fn file_type_label<'a>(&'a self, file_type: &str) -> &'a str {
        self.known_file_types
            .iter()
            .find(|known| known.as_str() == file_type)
            .map(String::as_str)
            .unwrap_or(OTHER_FILE_TYPE)
    }

    /// A document was stored.
    pub fn record_upload(&self, file_type: &str, size_bytes: u64, duration: Duration) {
        let file_type = self.file_type_label(file_type);
        let duration_ms = duration.as_secs_f64() * 1000.0;

        #[cfg(feature = "observability-opentelemetry")]
        {
            let labels = [
                KeyValue::new("file_type", file_type.to_string()),
                KeyValue::new("status", STATUS_SUCCESS),
            ];
            self.uploads.add(1, &labels);
            self.size.add(size_bytes, &labels);
            self.duration.record(duration_ms, &labels);
        }

        tracing::info!(
            target: "docupload::metrics",
            metric = UPLOADS_TOTAL,
            file_type = file_type,
            size_bytes = size_bytes,
            duration_ms = duration_ms,
            status = STATUS_SUCCESS,
            "Upload recorded"
        );
    }

    /// Storage rejected or lost the file. `error_kind` comes from `StorageError::kind`.
    pub fn record_upload_error(&self, file_type: &str, error_kind: &'static str) {
        let file_type = self.file_type_label(file_type);

        #[cfg(feature = "observability-opentelemetry")]
        self.errors.add(
            1,
            &[
                KeyValue::new("file_type", file_type.to_string()),
                KeyValue::new("error_type", error_kind),
                KeyValue::new("status", STATUS_ERROR),
            ],
        );

        tracing::info!(
            target: "docupload::metrics",
            metric = UPLOAD_ERRORS_TOTAL,
            file_type = file_type,
            error_type = error_kind,
            status = STATUS_ERROR,
            "Upload error recorded"
        );
    }

    /// The file broke one or more upload rules. Counted with storage failures.
    pub fn record_validation_error(&self, file_type: &str, errors: &[ValidationError]) {
        let file_type = self.file_type_label(file_type);
        let reason = errors
            .iter()
            .map(ValidationError::kind)
            .collect::<Vec<_>>()
            .join(",");

        #[cfg(feature = "observability-opentelemetry")]
        self.errors.add(
            1,
            &[
                KeyValue::new("file_type", file_type.to_string()),
                KeyValue::new("validation_error", reason.clone()),
                KeyValue::new("status", STATUS_VALIDATION_FAILED),
            ],
        );

        tracing::info!(
            target: "docupload::metrics",
            metric = UPLOAD_ERRORS_TOTAL,
            file_type = file_type,
            validation_error = %reason,
            status = STATUS_VALIDATION_FAILED,
            "Validation error recorded"
        );
    }
}
