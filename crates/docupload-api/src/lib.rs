//! Document Upload API Library
//!
//! This crate provides the HTTP handlers, the upload pipeline, and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
pub mod telemetry;
mod utils;

// Public modules
pub mod error;
pub mod state;

// Re-exports
pub use error::HttpAppError;
pub use services::upload::{DocumentUploadService, UploadRequest};
pub use state::AppState;
pub use telemetry::{metrics::UploadMetrics, MetricsProvider};
