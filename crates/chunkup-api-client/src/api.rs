//! Upload endpoints of the Chunkup API.

use crate::{api_prefix, ApiClient, UploadError};
use anyhow::Result;
use chunkup_core::models::{ChunkUploadResponse, CleanupRequest, CleanupResponse};
use reqwest::multipart::Form;

/// Pull the human-readable message out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.trim().to_string()
            }
        })
}

impl ApiClient {
    /// POST one chunk form to `/uploads/chunk` and decode the acknowledgement.
    pub async fn upload_chunk(
        &self,
        index: u32,
        form: Form,
    ) -> Result<ChunkUploadResponse, UploadError> {
        let url = self.build_url(&format!("{}/uploads/chunk", api_prefix()));
        let response = self
            .http()
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| UploadError::Transport { index, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| UploadError::Transport { index, source })?;

        if !status.is_success() {
            return Err(UploadError::Status {
                index,
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| UploadError::MalformedResponse {
            index,
            message: e.to_string(),
        })
    }

    /// Ask the server to drop an upload's temporary chunks.
    pub async fn cleanup_upload(&self, file_id: &str) -> Result<CleanupResponse> {
        let request = CleanupRequest {
            file_id: Some(file_id.to_string()),
        };
        self.post_json(&format!("{}/uploads/cleanup", api_prefix()), &request)
            .await
    }

    /// Server liveness plus the number of in-flight uploads.
    pub async fn health(&self) -> Result<serde_json::Value> {
        self.get("/health").await
    }
}
