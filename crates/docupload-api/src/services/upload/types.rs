use docupload_storage::IncomingFile;

/// One upload, as received from the client. Lives for a single request.
#[derive(Debug)]
pub struct UploadRequest {
    pub file: IncomingFile,
    pub description: Option<String>,
}

impl UploadRequest {
    pub fn new(file: IncomingFile, description: Option<String>) -> Self {
        Self { file, description }
    }

    /// Lowercased extension of the original filename, used for metric labels.
    pub fn file_type(&self) -> String {
        docupload_core::validation::file_extension(&self.file.metadata.file_name).to_lowercase()
    }
}
