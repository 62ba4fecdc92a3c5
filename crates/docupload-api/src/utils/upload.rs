//! Multipart upload extraction
//!
//! The `file` field is spooled to a temporary file under the configured temp
//! directory instead of being buffered in memory. The temp file is deleted when the
//! returned reader is dropped, whatever the outcome of the upload.

use std::io::SeekFrom;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::multipart::{Field, Multipart};
use docupload_core::{AppError, FileMetadata, FileUploadOptions};
use docupload_storage::IncomingFile;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWriteExt, ReadBuf};

use crate::constants::{DESCRIPTION_FIELD, FILE_FIELD};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Fields of an upload form. `file` is `None` when no usable file part was sent.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<IncomingFile>,
    pub description: Option<String>,
}

/// Read the upload form.
///
/// Only one field named `file` is accepted. A `file` part without a filename is
/// treated as absent. Reading stops as soon as the file exceeds the configured
/// maximum; the returned length is then larger than the maximum and validation
/// rejects it without the rest of the body being consumed.
pub async fn read_upload_form(
    mut multipart: Multipart,
    options: &FileUploadOptions,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart: {}", e)))?
    {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == FILE_FIELD {
            if form.file.is_some() {
                return Err(AppError::BadRequest(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            let file_name = match field.file_name() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    tracing::debug!("Ignoring file field without a filename");
                    continue;
                }
            };
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

            let spooled = spool_field(field, options).await?;
            let over_limit = spooled.length > options.max_file_size_bytes;
            form.file = Some(IncomingFile::new(
                FileMetadata::new(file_name, content_type, spooled.length),
                spooled,
            ));
            if over_limit {
                break;
            }
        } else if field_name == DESCRIPTION_FIELD {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read description: {}", e)))?;
            if !text.trim().is_empty() {
                form.description = Some(text);
            }
        }
    }

    Ok(form)
}

/// File bytes held in a temporary file, readable from the start.
pub struct SpooledFile {
    file: tokio::fs::File,
    length: u64,
    // Deletes the file on drop.
    _path: TempPath,
}

impl AsyncRead for SpooledFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

async fn spool_field(
    mut field: Field<'_>,
    options: &FileUploadOptions,
) -> Result<SpooledFile, AppError> {
    let (std_file, path) = NamedTempFile::new_in(&options.temp_path)?.into_parts();
    let mut file = tokio::fs::File::from_std(std_file);
    let mut length: u64 = 0;

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read file data: {}", e)))?
    {
        length += chunk.len() as u64;
        file.write_all(&chunk).await?;
        if length > options.max_file_size_bytes {
            tracing::debug!(
                length,
                max_file_size_bytes = options.max_file_size_bytes,
                "Upload exceeds maximum size, stopped reading"
            );
            break;
        }
    }

    file.flush().await?;
    file.seek(SeekFrom::Start(0)).await?;

    Ok(SpooledFile {
        file,
        length,
        _path: path,
    })
}
