//! Document upload pipeline: validate, store, record.

mod service;
mod types;

pub use service::DocumentUploadService;
pub use types::UploadRequest;
