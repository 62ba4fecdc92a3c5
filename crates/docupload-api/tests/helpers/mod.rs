//! Shared setup for HTTP-level tests.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use docupload_api::setup::{build_state, routes::setup_routes};
use docupload_api::AppState;
use docupload_core::{Config, FileUploadOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const MB: u64 = 1024 * 1024;

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_path(&self) -> PathBuf {
        self.state.config.file_upload.storage_path.clone()
    }

    pub fn temp_path(&self) -> PathBuf {
        self.state.config.file_upload.temp_path.clone()
    }

    pub fn stored_files(&self) -> Vec<PathBuf> {
        list_dir(&self.storage_path())
    }

    pub fn spooled_files(&self) -> Vec<PathBuf> {
        list_dir(&self.temp_path())
    }
}

fn list_dir(path: &std::path::Path) -> Vec<PathBuf> {
    std::fs::read_dir(path)
        .expect("Failed to read directory")
        .map(|entry| entry.expect("Failed to read entry").path())
        .collect()
}

/// Setup a test application with default upload policy
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_max_size(100 * MB).await
}

/// Setup a test application with a custom maximum file size
pub async fn setup_test_app_with_max_size(max_file_size_bytes: u64) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = create_test_config(&temp_dir, max_file_size_bytes);

    let state = build_state(config.clone())
        .await
        .expect("Failed to build application state");
    let app = setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

/// Create test configuration
fn create_test_config(temp_dir: &TempDir, max_file_size_bytes: u64) -> Config {
    Config {
        file_upload: FileUploadOptions {
            storage_path: temp_dir.path().join("uploads"),
            temp_path: temp_dir.path().join("temp"),
            max_file_size_bytes,
            ..FileUploadOptions::default()
        },
        ..Config::default()
    }
}

/// Multipart form with a single `file` part.
pub fn file_form(file_name: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data)
            .file_name(file_name)
            .mime_type(content_type),
    )
}

pub fn is_stored_name(name: &str, extension: &str) -> bool {
    match name.strip_suffix(extension) {
        Some(id) => {
            id.len() == 32
                && id
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        }
        None => false,
    }
}
