use crate::constants::DOCUMENTS_PATH;
use crate::error::HttpAppError;
use crate::services::upload::{DocumentUploadService, UploadRequest};
use crate::state::AppState;
use crate::utils::upload::read_upload_form;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use docupload_core::{ApiError, AppError, UploadResponse};
use docupload_storage::CancellationToken;
use std::sync::Arc;
use utoipa::ToSchema;

/// Multipart body accepted by the upload endpoint (documentation only).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadDocumentForm {
    /// The document to upload
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Optional free-text description
    description: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/documents/upload",
    tag = "Document Upload",
    request_body(content = inline(UploadDocumentForm), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document uploaded successfully", body = UploadResponse,
            headers(("Location" = String, description = "URL of the stored document"))),
        (status = 400, description = "File missing or failed validation", body = ApiError),
        (status = 500, description = "Storage failure", body = ApiError)
    )
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    receive_and_store(&state, multipart)
        .await
        .map_err(|e| HttpAppError::for_config(e, &state.config))
}

async fn receive_and_store(
    state: &AppState,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart, &state.config.file_upload).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::Validation("File is required".to_string()))?;

    tracing::debug!(
        file_name = %file.metadata.file_name,
        content_type = %file.metadata.content_type,
        length = file.metadata.length,
        "Received upload"
    );

    let request = UploadRequest::new(file, form.description);
    let response = run_upload(state.upload_service.clone(), request).await?;
    let location = format!("{}/{}", DOCUMENTS_PATH, response.id);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(response),
    ))
}

/// Run the upload in its own task so the save observes a token instead of being
/// dropped mid-write. Dropping this future cancels the token, and storage removes the
/// partial file.
async fn run_upload(
    service: Arc<DocumentUploadService>,
    request: UploadRequest,
) -> Result<UploadResponse, AppError> {
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let result = tokio::spawn(async move { service.upload(request, &cancel).await })
        .await
        .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))?;
    let _ = guard.disarm();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MetricsProvider;
    use docupload_core::{FileMetadata, FileValidator};
    use docupload_storage::{IncomingFile, LocalStorage};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::AsyncWriteExt;

    fn stored_files(dir: &Path) -> Vec<std::path::PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached in time"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_dropped_request_removes_partial_file() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let storage = LocalStorage::new(&uploads, dir.path().join("temp"))
            .await
            .unwrap();
        let service = Arc::new(DocumentUploadService::new(
            Arc::new(FileValidator::new(1024 * 1024, vec![".txt".to_string()])),
            Arc::new(storage),
            Arc::new(MetricsProvider::disabled().upload_metrics(vec![".txt".to_string()])),
        ));

        // Client sends one chunk of a larger file, then stalls.
        let (mut client, body) = tokio::io::duplex(64);
        client.write_all(b"first chunk").await.unwrap();
        let request = UploadRequest::new(
            IncomingFile::new(FileMetadata::new("a.txt", "text/plain", 1024), body),
            None,
        );

        let mut upload = Box::pin(run_upload(service, request));
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while stored_files(&uploads).is_empty() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "upload never started writing"
            );
            tokio::select! {
                _ = &mut upload => panic!("upload finished while the client was stalled"),
                _ = tokio::time::sleep(Duration::from_millis(10)) => {}
            }
        }

        // Connection dropped: the handler future goes away mid-save.
        drop(upload);

        wait_until(|| stored_files(&uploads).is_empty()).await;
        drop(client);
    }

    #[tokio::test]
    async fn test_completed_upload_keeps_file() {
        let dir = tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        let storage = LocalStorage::new(&uploads, dir.path().join("temp"))
            .await
            .unwrap();
        let service = Arc::new(DocumentUploadService::new(
            Arc::new(FileValidator::new(1024 * 1024, vec![".txt".to_string()])),
            Arc::new(storage),
            Arc::new(MetricsProvider::disabled().upload_metrics(vec![".txt".to_string()])),
        ));

        let request = UploadRequest::new(
            IncomingFile::new(
                FileMetadata::new("a.txt", "text/plain", 5),
                std::io::Cursor::new(b"hello".to_vec()),
            ),
            None,
        );

        let response = run_upload(service, request).await.unwrap();
        assert_eq!(
            stored_files(&uploads),
            vec![std::path::PathBuf::from(&response.storage_path)]
        );
    }
}
