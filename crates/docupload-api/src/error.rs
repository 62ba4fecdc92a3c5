//! HTTP error response conversion
//!
//! This module provides HTTP-specific error response conversion for AppError.
//!
//! **Preferred handler pattern:** Return `Result<impl IntoResponse, HttpAppError>` and let
//! `?` convert `AppError` (or anything that converts into it) so every failure renders
//! the same `ApiError` body and is logged once.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docupload_core::{ApiError, AppError, Config, ErrorMetadata, LogLevel};
use docupload_storage::StorageError;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from docupload-core)
///
/// Plain conversions never expose `details`; use [`HttpAppError::for_config`] where
/// the loaded configuration is at hand.
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    expose_details: bool,
}

impl HttpAppError {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            expose_details: false,
        }
    }

    /// Server-side failures carry `details` unless `config` is a production environment.
    pub fn for_config(error: AppError, config: &Config) -> Self {
        Self {
            error,
            expose_details: !config.is_production(),
        }
    }

    pub fn body(&self) -> ApiError {
        error_body(&self.error, self.expose_details)
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::new(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::new(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::InvalidKey(msg) => AppError::BadRequest(msg),
            other => AppError::InternalWithSource {
                message: other.to_string(),
                source: anyhow::Error::new(other),
            },
        };
        HttpAppError::new(app)
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                detail = %error.detailed_message(),
                error_type = error_type,
                "Error occurred"
            );
        }
    }
}

/// Body for an error. Server-side failures carry a short `details` string when
/// `expose_details` is set; client errors never need one.
pub fn error_body(app_error: &AppError, expose_details: bool) -> ApiError {
    let details = if app_error.is_sensitive() && expose_details {
        Some(app_error.detailed_message())
    } else {
        None
    };
    ApiError::new(
        app_error.client_message(),
        details,
        app_error.http_status_code(),
    )
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(&self.error);

        (status, Json(self.body())).into_response()
    }
}
