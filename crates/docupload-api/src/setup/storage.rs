//! Storage setup and initialization

use anyhow::{Context, Result};
use docupload_core::Config;
use docupload_storage::{LocalStorage, Storage};
use std::sync::Arc;

/// Create the storage backend. Creates the storage and temp directories; failing to
/// do so aborts startup.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let options = &config.file_upload;
    let storage = LocalStorage::new(&options.storage_path, &options.temp_path)
        .await
        .with_context(|| {
            format!(
                "Failed to initialize storage at {}",
                options.storage_path.display()
            )
        })?;
    tracing::info!(
        backend = storage.backend_name(),
        storage_path = %options.storage_path.display(),
        temp_path = %options.temp_path.display(),
        "Storage initialized successfully"
    );
    Ok(Arc::new(storage))
}
