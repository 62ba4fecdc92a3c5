//! Document Upload Core Library
//!
//! This crate provides configuration, the shared data model, error types, and upload
//! validation used by the storage and API crates.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ApiSettings, Config, FileUploadOptions, LogFormat, TelemetrySettings};
pub use error::{AppError, ErrorMetadata, LogLevel, GENERIC_FAILURE_MESSAGE};
pub use models::{ApiError, FileMetadata, UploadResponse};
pub use validation::{FileValidator, Validate, ValidationError, ValidationResult};
