//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p chunkup-api --test uploads_test`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use chunkup_api::constants;
use chunkup_api::setup::{self, routes};
use chunkup_core::{Config, UploadServiceConfig};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus the storage directory it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub _temp_dir: TempDir,
    storage_root: PathBuf,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Directory holding the chunks of one in-flight upload
    pub fn temp_dir_for(&self, file_id: &str) -> PathBuf {
        self.storage_root.join("temp").join(file_id)
    }

    /// Number of in-flight upload directories
    pub fn temp_upload_count(&self) -> usize {
        std::fs::read_dir(self.storage_root.join("temp"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Setup test app with default configuration and isolated local storage.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app after adjusting the configuration.
pub async fn setup_test_app_with(adjust: impl FnOnce(&mut UploadServiceConfig)) -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage_root = temp_dir.path().join("storage");

    let mut inner = UploadServiceConfig::with_storage_path(storage_root.to_string_lossy());
    adjust(&mut inner);
    let config = Config(Box::new(inner));

    let state = setup::build_state(&config)
        .await
        .expect("Failed to build state");
    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        _temp_dir: temp_dir,
        storage_root,
    }
}

/// Fields of one chunk request
pub struct ChunkRequest<'a> {
    pub index: String,
    pub total: String,
    pub file_name: &'a str,
    pub document_type: Option<&'a str>,
    pub file_id: Option<&'a str>,
    pub data: Vec<u8>,
}

impl<'a> ChunkRequest<'a> {
    pub fn new(index: u32, total: u32, file_name: &'a str, data: Vec<u8>) -> Self {
        Self::raw(&index.to_string(), &total.to_string(), file_name, data)
    }

    /// Index and total exactly as sent on the wire
    pub fn raw(index: &str, total: &str, file_name: &'a str, data: Vec<u8>) -> Self {
        Self {
            index: index.to_string(),
            total: total.to_string(),
            file_name,
            document_type: None,
            file_id: None,
            data,
        }
    }

    pub fn document_type(mut self, document_type: &'a str) -> Self {
        self.document_type = Some(document_type);
        self
    }

    pub fn file_id(mut self, file_id: &'a str) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn into_form(self) -> MultipartForm {
        let part = Part::bytes(bytes::Bytes::from(self.data))
            .file_name(self.file_name.to_string())
            .mime_type("application/octet-stream");

        let mut form = MultipartForm::new()
            .add_part("file", part)
            .add_text("chunkIndex", self.index)
            .add_text("totalChunks", self.total)
            .add_text("fileName", self.file_name.to_string());
        if let Some(document_type) = self.document_type {
            form = form.add_text("document_type", document_type.to_string());
        }
        if let Some(file_id) = self.file_id {
            form = form.add_text("fileId", file_id.to_string());
        }
        form
    }
}

/// Send one chunk and return the response
pub async fn send_chunk(client: &TestServer, request: ChunkRequest<'_>) -> axum_test::TestResponse {
    client
        .post(&api_path("/uploads/chunk"))
        .multipart(request.into_form())
        .await
}

/// Deterministic test payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
