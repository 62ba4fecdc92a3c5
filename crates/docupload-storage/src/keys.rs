//! Shared stored-name generation for storage backends.

use crate::traits::{StorageError, StorageResult};
use docupload_core::validation::file_extension;
use uuid::Uuid;

/// Generate a new file identifier: 128 random bits as 32 lowercase hex characters.
pub fn generate_file_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Stored name for a file: identifier followed by the original extension.
pub fn stored_file_name(file_id: &str, original_file_name: &str) -> String {
    format!("{}{}", file_id, file_extension(original_file_name))
}

/// Reject names that could address anything other than a file directly inside the
/// storage directory.
pub fn validate_stored_file_name(file_name: &str) -> StorageResult<()> {
    if file_name.trim().is_empty() {
        return Err(StorageError::InvalidKey(
            "File name cannot be empty".to_string(),
        ));
    }
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(StorageError::InvalidKey(
            "File name contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
