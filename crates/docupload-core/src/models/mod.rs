//! Data models shared by storage backends and the HTTP layer

pub mod document;

pub use document::{ApiError, FileMetadata, UploadResponse};
