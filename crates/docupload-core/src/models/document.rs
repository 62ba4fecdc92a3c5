use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What is known about an uploaded file before its bytes are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Filename as sent by the client
    pub file_name: String,
    /// Declared content type (defaults to application/octet-stream)
    pub content_type: String,
    /// Length in bytes
    pub length: u64,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, length: u64) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            length,
        }
    }
}

/// Metadata describing a stored document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Generated identifier (32 lowercase hex characters)
    pub id: String,
    /// Stored filename: identifier followed by the original extension
    pub file_name: String,
    pub original_file_name: String,
    pub file_size: u64,
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub storage_path: String,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status_code: u16,
}

impl ApiError {
    pub fn new(message: impl Into<String>, details: Option<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            details,
            status_code,
        }
    }
}
