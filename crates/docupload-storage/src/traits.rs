//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use async_trait::async_trait;
use docupload_core::{FileMetadata, UploadResponse};
use std::fmt;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    /// Stable classification, used as a metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::UploadFailed(_) => "upload_failed",
            StorageError::Cancelled => "cancelled",
            StorageError::AlreadyExists(_) => "already_exists",
            StorageError::DeleteFailed(_) => "delete_failed",
            StorageError::InvalidKey(_) => "invalid_key",
            StorageError::IoError(_) => "io",
            StorageError::ConfigError(_) => "config",
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An uploaded file on its way into storage: what the client declared about it plus
/// a reader over its bytes.
pub struct IncomingFile {
    pub metadata: FileMetadata,
    pub reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
}

impl IncomingFile {
    pub fn new(metadata: FileMetadata, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            metadata,
            reader: Box::pin(reader),
        }
    }
}

impl fmt::Debug for IncomingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingFile")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Storage abstraction trait
///
/// The upload pipeline only talks to this trait, so a different backend (object
/// storage, a network filesystem) can be substituted without touching it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist the file under a newly generated identifier and describe the result.
    ///
    /// The copy stops as soon as `cancel` fires. On cancellation or any failure after
    /// the destination was created, the partially written file is removed before the
    /// error is returned.
    async fn save(
        &self,
        file: IncomingFile,
        description: Option<&str>,
        cancel: &CancellationToken,
    ) -> StorageResult<UploadResponse>;

    /// Check whether a stored file exists
    async fn exists(&self, file_name: &str) -> StorageResult<bool>;

    /// Delete a stored file. Returns `false` when there was nothing to delete.
    async fn delete(&self, file_name: &str) -> StorageResult<bool>;

    /// Verify the backend is usable
    async fn health_check(&self) -> StorageResult<()>;

    /// Short backend name for logs and health output
    fn backend_name(&self) -> &'static str;
}
