//! HTTP client for the Chunkup API.
//!
//! [`ApiClient`] wraps the raw endpoints; [`ChunkedUploader`] splits a
//! [`ByteSource`] into chunks and sends them one at a time, reporting progress
//! over a channel and cleaning up server-side on failure or abort.

pub mod api;
pub mod error;
pub mod source;
pub mod splitter;
pub mod transmitter;

pub use error::UploadError;
pub use source::{ByteSource, FileSource, MemorySource};
pub use splitter::{plan_chunks, DEFAULT_CHUNK_SIZE};
pub use transmitter::{AbortHandle, ChunkedUploader, UploadEvent};

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// API version prefix (e.g. "/api/v0"). Set CHUNKUP_API_VERSION to match the server.
pub fn api_prefix() -> String {
    let version = std::env::var("CHUNKUP_API_VERSION").unwrap_or_else(|_| "v0".to_string());
    format!("/api/{}", version)
}

/// HTTP client for the Chunkup API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create client from environment: CHUNKUP_API_URL (or API_URL), default `http://localhost:4000`.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("CHUNKUP_API_URL")
            .or_else(|_| std::env::var("API_URL"))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request")?;

        parse_json_response(response).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        parse_json_response(response).await
    }
}

async fn parse_json_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            error_text
        ));
    }

    let body: T = response
        .json()
        .await
        .context("Failed to parse response as JSON")?;

    Ok(body)
}
