//! Sequential chunk transmitter
//!
//! Chunks go out strictly in order, one request at a time. Progress and
//! per-chunk acknowledgements are published on an optional channel; the
//! outcome is the future's result.

use crate::source::ByteSource;
use crate::splitter::{plan_chunks, DEFAULT_CHUNK_SIZE};
use crate::{ApiClient, UploadError};
use bytes::Bytes;
use chunkup_core::models::{ChunkUploadResponse, UploadComplete};
use chunkup_core::DocumentType;
use futures::stream;
use reqwest::multipart::{Form, Part};
use std::ops::Range;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Slice size the chunk body is streamed in; each polled slice reports progress
const PROGRESS_SLICE: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Overall progress, 0 to 100
    Progress {
        percent: f64,
        bytes_sent: u64,
        total_bytes: u64,
    },
    /// The server stored a chunk
    ChunkAcknowledged {
        index: u32,
        total_chunks: u32,
        file_id: String,
    },
}

fn percent(sent: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (sent as f64 / total as f64 * 100.0).min(100.0)
}

/// Requests that an upload stop before its next chunk
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(CancellationToken);

impl AbortHandle {
    pub fn abort(&self) {
        self.0.cancel();
    }

    pub fn is_aborted(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Uploads one byte source as a sequence of chunks
pub struct ChunkedUploader<S> {
    client: ApiClient,
    source: S,
    file_name: String,
    chunk_size: u64,
    document_type: DocumentType,
    category: Option<String>,
    abort: AbortHandle,
    events: Option<UnboundedSender<UploadEvent>>,
}

impl<S: ByteSource> ChunkedUploader<S> {
    pub fn new(client: ApiClient, source: S, file_name: impl Into<String>) -> Self {
        Self {
            client,
            source,
            file_name: file_name.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            document_type: DocumentType::default(),
            category: None,
            abort: AbortHandle::default(),
            events: None,
        }
    }

    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn document_type(mut self, document_type: DocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    /// Human-readable label sent with every chunk; defaults to the document type
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn events(mut self, events: UnboundedSender<UploadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Handle that aborts this upload from another task
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    fn emit(&self, event: UploadEvent) {
        if let Some(events) = &self.events {
            // Receiver gone means nobody is listening
            let _ = events.send(event);
        }
    }

    /// Send every chunk in order. On any failure or abort the server-side
    /// temporary upload is cleaned up before the error is returned.
    #[tracing::instrument(
        skip(self),
        fields(file_name = %self.file_name, total_bytes = self.source.len())
    )]
    pub async fn start(self) -> Result<UploadComplete, UploadError> {
        let mut file_id: Option<String> = None;
        let result = self.send_all(&mut file_id).await;

        if let Err(e) = &result {
            tracing::warn!(error = %e, file_id = ?file_id, "Chunked upload failed");
            self.cleanup(file_id.as_deref()).await;
        }

        result
    }

    async fn send_all(&self, file_id: &mut Option<String>) -> Result<UploadComplete, UploadError> {
        let total_bytes = self.source.len();
        let plan = plan_chunks(total_bytes, self.chunk_size);
        let total_chunks = plan.len() as u32;
        let mut bytes_sent = 0u64;

        for (index, range) in plan.into_iter().enumerate() {
            let index = index as u32;
            let data = self
                .source
                .read_range(range.clone())
                .await
                .map_err(|source| UploadError::Io { index, source })?;

            if self.abort.is_aborted() {
                return Err(UploadError::Aborted);
            }

            let form = self.chunk_form(index, total_chunks, data, file_id.as_deref(), bytes_sent);
            let response = self.client.upload_chunk(index, form).await?;
            bytes_sent += range.end - range.start;

            let is_last = index + 1 == total_chunks;
            match response {
                ChunkUploadResponse::Partial(ack) if !is_last => {
                    let id = file_id.get_or_insert(ack.file_id);
                    tracing::debug!(index, total_chunks, file_id = %id, "Chunk acknowledged");
                    self.emit(UploadEvent::ChunkAcknowledged {
                        index,
                        total_chunks,
                        file_id: id.clone(),
                    });
                    self.emit(UploadEvent::Progress {
                        percent: percent(bytes_sent, total_bytes),
                        bytes_sent,
                        total_bytes,
                    });
                }
                ChunkUploadResponse::Complete(complete) if is_last => {
                    file_id.get_or_insert_with(|| complete.file_id.clone());
                    self.emit(UploadEvent::ChunkAcknowledged {
                        index,
                        total_chunks,
                        file_id: complete.file_id.clone(),
                    });
                    self.emit(UploadEvent::Progress {
                        percent: percent(bytes_sent, total_bytes),
                        bytes_sent,
                        total_bytes,
                    });

                    if self.abort.is_aborted() {
                        return Err(UploadError::Aborted);
                    }

                    tracing::info!(
                        file_path = %complete.file_path,
                        size_bytes = complete.size,
                        "Chunked upload completed"
                    );
                    return Ok(complete);
                }
                ChunkUploadResponse::Partial(_) => {
                    return Err(UploadError::MalformedResponse {
                        index,
                        message: "final chunk was acknowledged without an upload result"
                            .to_string(),
                    });
                }
                ChunkUploadResponse::Complete(_) => {
                    return Err(UploadError::MalformedResponse {
                        index,
                        message: format!(
                            "upload completed early at chunk {} of {}",
                            index + 1,
                            total_chunks
                        ),
                    });
                }
            }
        }

        // plan_chunks never returns an empty plan
        Err(UploadError::MalformedResponse {
            index: total_chunks,
            message: "no chunks were sent".to_string(),
        })
    }

    fn chunk_form(
        &self,
        index: u32,
        total_chunks: u32,
        data: Bytes,
        file_id: Option<&str>,
        bytes_before: u64,
    ) -> Form {
        let category = self
            .category
            .clone()
            .unwrap_or_else(|| self.document_type.as_str().to_string());

        let mut form = Form::new()
            .text("chunkIndex", index.to_string())
            .text("totalChunks", total_chunks.to_string())
            .text("fileName", self.file_name.clone())
            .text("document_type", self.document_type.as_str())
            .text("category", category);
        if let Some(id) = file_id {
            form = form.text("fileId", id.to_string());
        }

        form.part("file", self.progress_part(data, bytes_before))
    }

    /// Chunk body streamed in slices; progress is reported as the transport pulls each one.
    fn progress_part(&self, data: Bytes, bytes_before: u64) -> Part {
        let length = data.len() as u64;
        let part = if data.is_empty() {
            Part::bytes(Vec::new())
        } else {
            let total_bytes = self.source.len();
            let events = self.events.clone();
            let slices: Vec<Range<usize>> = (0..data.len())
                .step_by(PROGRESS_SLICE)
                .map(|start| start..(start + PROGRESS_SLICE).min(data.len()))
                .collect();

            let body = stream::iter(slices.into_iter().map(move |slice| {
                if let Some(events) = &events {
                    let bytes_sent = bytes_before + slice.end as u64;
                    let _ = events.send(UploadEvent::Progress {
                        percent: percent(bytes_sent, total_bytes),
                        bytes_sent,
                        total_bytes,
                    });
                }
                Ok::<Bytes, std::io::Error>(data.slice(slice))
            }));
            Part::stream_with_length(reqwest::Body::wrap_stream(body), length)
        };

        part.file_name(self.file_name.clone())
    }

    /// Best-effort server cleanup; failures are logged only.
    async fn cleanup(&self, file_id: Option<&str>) {
        let Some(file_id) = file_id else {
            tracing::debug!("No upload id issued yet, nothing to clean up");
            return;
        };

        match self.client.cleanup_upload(file_id).await {
            Ok(_) => tracing::info!(file_id = %file_id, "Server-side upload cleaned up"),
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "Failed to clean up upload")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped_and_handles_empty_sources() {
        assert_eq!(percent(0, 0), 100.0);
        assert_eq!(percent(50, 200), 25.0);
        assert_eq!(percent(300, 200), 100.0);
    }

    #[test]
    fn abort_handle_is_shared() {
        let handle = AbortHandle::default();
        let clone = handle.clone();
        assert!(!handle.is_aborted());
        clone.abort();
        assert!(handle.is_aborted());
    }
}
