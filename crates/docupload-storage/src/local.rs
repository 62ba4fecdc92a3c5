use crate::keys;
use crate::traits::{IncomingFile, Storage, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::Utc;
use docupload_core::UploadResponse;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Local filesystem storage implementation
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
    temp_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating both directories if needed.
    ///
    /// # Arguments
    /// * `base_path` - Directory stored documents are written to (e.g., "/app/uploads")
    /// * `temp_path` - Directory for in-flight upload spool files (e.g., "/app/temp")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        temp_path: impl Into<PathBuf>,
    ) -> StorageResult<Self> {
        let storage = LocalStorage {
            base_path: base_path.into(),
            temp_path: temp_path.into(),
        };

        ensure_dir(&storage.base_path, "storage").await?;
        ensure_dir(&storage.temp_path, "temp").await?;

        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn file_path(&self, file_name: &str) -> StorageResult<PathBuf> {
        keys::validate_stored_file_name(file_name)?;
        Ok(self.base_path.join(file_name))
    }

    /// Best-effort removal of a partially written file. Failures are logged only.
    async fn remove_partial(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed partial file");
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "Failed to clean up partial file"
                );
            }
        }
    }
}

async fn ensure_dir(path: &Path, label: &str) -> StorageResult<()> {
    if let Ok(meta) = fs::metadata(path).await {
        if meta.is_dir() {
            return Ok(());
        }
        return Err(StorageError::ConfigError(format!(
            "{} path {} exists and is not a directory",
            label,
            path.display()
        )));
    }

    fs::create_dir_all(path).await.map_err(|e| {
        StorageError::ConfigError(format!(
            "Failed to create {} directory {}: {}",
            label,
            path.display(),
            e
        ))
    })?;

    tracing::info!(path = %path.display(), "Created {} directory", label);
    Ok(())
}

/// Copy `reader` into `writer` until EOF, giving up as soon as `cancel` fires.
async fn copy_with_cancel<R, W>(
    reader: &mut R,
    writer: &mut W,
    cancel: &CancellationToken,
) -> StorageResult<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total: u64 = 0;

    loop {
        let n = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            read = reader.read(&mut buf) => read.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to read upload stream: {}", e))
            })?,
        };

        if n == 0 {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StorageError::Cancelled),
            written = writer.write_all(&buf[..n]) => written.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to write file: {}", e))
            })?,
        }

        total += n as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| StorageError::UploadFailed(format!("Failed to flush file: {}", e)))?;

    Ok(total)
}

#[async_trait]
impl Storage for LocalStorage {
    async fn save(
        &self,
        file: IncomingFile,
        description: Option<&str>,
        cancel: &CancellationToken,
    ) -> StorageResult<UploadResponse> {
        let IncomingFile {
            metadata,
            mut reader,
        } = file;

        let file_id = keys::generate_file_id();
        let stored_name = keys::stored_file_name(&file_id, &metadata.file_name);
        let path = self.base_path.join(&stored_name);
        let start = std::time::Instant::now();

        tracing::info!(
            original_file_name = %metadata.file_name,
            file_name = %stored_name,
            description_len = description.map(str::len).unwrap_or(0),
            "Saving file"
        );

        let mut dest = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    StorageError::AlreadyExists(stored_name.clone())
                } else {
                    StorageError::UploadFailed(format!(
                        "Failed to create file {}: {}",
                        path.display(),
                        e
                    ))
                }
            })?;

        let written = async {
            let copied = copy_with_cancel(&mut reader, &mut dest, cancel).await?;
            dest.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
            })?;
            Ok::<u64, StorageError>(copied)
        }
        .await;
        drop(dest);

        let file_size = match written {
            Ok(copied) => copied,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    original_file_name = %metadata.file_name,
                    file_id = %file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Failed to save file"
                );
                self.remove_partial(&path).await;
                return Err(e);
            }
        };

        tracing::info!(
            file_id = %file_id,
            file_name = %stored_name,
            size_bytes = file_size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(UploadResponse {
            id: file_id,
            file_name: stored_name,
            original_file_name: metadata.file_name,
            file_size,
            content_type: metadata.content_type,
            uploaded_at: Utc::now(),
            storage_path: path.display().to_string(),
        })
    }

    async fn exists(&self, file_name: &str) -> StorageResult<bool> {
        let path = self.file_path(file_name)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn delete(&self, file_name: &str) -> StorageResult<bool> {
        let path = self.file_path(file_name)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file_name = %file_name, "Deleted file");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(file_name = %file_name, "File not found for deletion");
                Ok(false)
            }
            Err(e) => {
                tracing::error!(error = %e, file_name = %file_name, "Failed to delete file");
                Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    async fn health_check(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.base_path).await?;
        if !meta.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "{} is not a directory",
                self.base_path.display()
            )));
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use docupload_core::FileMetadata;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::ReadBuf;

    async fn test_storage(dir: &Path) -> LocalStorage {
        LocalStorage::new(dir.join("uploads"), dir.join("temp"))
            .await
            .unwrap()
    }

    fn incoming(name: &str, data: &[u8]) -> IncomingFile {
        IncomingFile::new(
            FileMetadata::new(name, "text/plain", data.len() as u64),
            io::Cursor::new(data.to_vec()),
        )
    }

    fn stored_files(storage: &LocalStorage) -> Vec<PathBuf> {
        std::fs::read_dir(storage.base_path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    /// Yields its payload once, then fails.
    struct FailingReader {
        payload: Option<Vec<u8>>,
    }

    impl AsyncRead for FailingReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            match self.payload.take() {
                Some(payload) => {
                    buf.put_slice(&payload);
                    Poll::Ready(Ok(()))
                }
                None => Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "client went away",
                ))),
            }
        }
    }

    #[tokio::test]
    async fn test_new_creates_directories() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        assert!(storage.base_path().is_dir());
        assert!(storage.temp_path().is_dir());
        assert!(storage.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_new_fails_when_path_is_a_file() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let result = LocalStorage::new(blocker.join("uploads"), dir.path().join("temp")).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_save_writes_file_and_describes_it() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();

        let response = storage
            .save(incoming("a.txt", b"0123456789"), Some("notes"), &token)
            .await
            .unwrap();

        assert_eq!(response.id.len(), 32);
        assert_eq!(response.file_name, format!("{}.txt", response.id));
        assert_eq!(response.original_file_name, "a.txt");
        assert_eq!(response.file_size, 10);
        assert_eq!(response.content_type, "text/plain");
        assert_eq!(
            PathBuf::from(&response.storage_path),
            storage.base_path().join(&response.file_name)
        );

        let on_disk = std::fs::read(&response.storage_path).unwrap();
        assert_eq!(on_disk, b"0123456789");
    }

    #[tokio::test]
    async fn test_same_original_name_never_collides() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();

        let first = storage
            .save(incoming("same.txt", b"one"), None, &token)
            .await
            .unwrap();
        let second = storage
            .save(incoming("same.txt", b"two"), None, &token)
            .await
            .unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(first.storage_path, second.storage_path);
        assert_eq!(stored_files(&storage).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_copy_removes_partial_file() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();

        let file = IncomingFile::new(
            FileMetadata::new("broken.txt", "text/plain", 100),
            FailingReader {
                payload: Some(b"partial".to_vec()),
            },
        );

        let result = storage.save(file, None, &token).await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
        assert!(stored_files(&storage).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_copy_removes_partial_file() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();

        // The writer half stays open, so the copy blocks after the first chunk.
        let (mut writer, reader) = tokio::io::duplex(1024);
        writer.write_all(b"first chunk").await.unwrap();
        let file = IncomingFile::new(FileMetadata::new("slow.txt", "text/plain", 1000), reader);

        let task_storage = storage.clone();
        let task_token = token.clone();
        let handle =
            tokio::spawn(async move { task_storage.save(file, None, &task_token).await });

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while stored_files(&storage).is_empty() {
            assert!(tokio::time::Instant::now() < deadline, "copy never started");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        token.cancel();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert!(stored_files(&storage).is_empty());
        drop(writer);
    }

    #[tokio::test]
    async fn test_already_cancelled_token_leaves_nothing_behind() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();
        token.cancel();

        let result = storage.save(incoming("a.txt", b"data"), None, &token).await;
        assert!(matches!(result, Err(StorageError::Cancelled)));
        assert!(stored_files(&storage).is_empty());
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let token = CancellationToken::new();

        let response = storage
            .save(incoming("exists.txt", b"test"), None, &token)
            .await
            .unwrap();

        assert!(storage.exists(&response.file_name).await.unwrap());
        assert!(storage.delete(&response.file_name).await.unwrap());
        assert!(!storage.exists(&response.file_name).await.unwrap());
        // Second delete is a no-op
        assert!(!storage.delete(&response.file_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_exists_reports_io_errors() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        // Storage directory replaced by a regular file: lookups fail with ENOTDIR,
        // which must not read as "not found".
        std::fs::remove_dir_all(storage.base_path()).unwrap();
        std::fs::write(storage.base_path(), b"not a directory").unwrap();

        let result = storage.exists("0123abcd.txt").await;
        assert!(
            matches!(result, Err(StorageError::IoError(_))),
            "unexpected {:?}",
            result
        );
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        let result = storage.delete("../../../etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = storage.exists("/etc/passwd").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
