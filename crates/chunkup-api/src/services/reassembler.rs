//! Chunk reassembly
//!
//! Persists each incoming chunk under its upload's temp directory and, when the
//! final index arrives, concatenates every chunk in order into
//! `<storage>/<category>/<fileName>`.

use bytes::Bytes;
use chrono::Utc;
use chunkup_core::models::{ChunkAck, ChunkUploadResponse, UploadComplete, UploadSession};
use chunkup_core::{AppError, DocumentRecorder, DocumentType, DuplicateChunkPolicy};
use chunkup_storage::keys::{artifact_key, is_valid_upload_id, temp_dir_key};
use chunkup_storage::{ChunkStore, SessionStore, StorageError};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::utils::upload::sanitize_filename;

/// Metadata carried by one chunk request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeta {
    pub chunk_index: u32,
    pub total_chunks: u32,
    /// Client-supplied filename, reported back as `originalName`
    pub file_name: String,
    pub document_type: DocumentType,
    /// Human readable label sent alongside the category; logged only
    pub category: Option<String>,
    /// Upload identifier from an earlier response, when the client sends it
    pub file_id: Option<String>,
}

/// Where a chunk goes and which category it belongs to
struct Target {
    upload_id: String,
    temp_dir: String,
    document_type: DocumentType,
}

#[derive(Clone)]
pub struct ChunkReassembler {
    chunks: Arc<dyn ChunkStore>,
    sessions: Arc<dyn SessionStore>,
    recorder: Arc<dyn DocumentRecorder>,
    duplicate_policy: DuplicateChunkPolicy,
}

/// Longest file-name prefix used in keys, leaving room for the count and a
/// uuid within the 255-byte upload id limit
const KEY_NAME_MAX: usize = 200;

/// Key shared by every upload of the same file with the same chunk count
fn file_key(safe_name: &str, total_chunks: u32) -> String {
    // Sanitized names are ASCII, so byte slicing stays on char boundaries
    let name = &safe_name[..safe_name.len().min(KEY_NAME_MAX)];
    format!("{}-{}", name, total_chunks)
}

impl ChunkReassembler {
    pub fn new(
        chunks: Arc<dyn ChunkStore>,
        sessions: Arc<dyn SessionStore>,
        recorder: Arc<dyn DocumentRecorder>,
        duplicate_policy: DuplicateChunkPolicy,
    ) -> Self {
        Self {
            chunks,
            sessions,
            recorder,
            duplicate_policy,
        }
    }

    /// Store one chunk, assembling the artifact when it is the last one.
    #[tracing::instrument(
        skip(self, meta, payload),
        fields(
            chunk_index = meta.chunk_index,
            total_chunks = meta.total_chunks,
            file_name = %meta.file_name,
            size_bytes = payload.len()
        )
    )]
    pub async fn handle_chunk(
        &self,
        meta: ChunkMeta,
        payload: Bytes,
    ) -> Result<ChunkUploadResponse, AppError> {
        if meta.total_chunks == 0 {
            return Err(AppError::InvalidInput(
                "totalChunks must be at least 1".to_string(),
            ));
        }
        if meta.chunk_index >= meta.total_chunks {
            return Err(AppError::InvalidInput(format!(
                "chunkIndex {} is out of range for totalChunks {}",
                meta.chunk_index, meta.total_chunks
            )));
        }
        if let Some(id) = meta.file_id.as_deref() {
            if !is_valid_upload_id(id) {
                return Err(AppError::InvalidInput(format!("Invalid fileId: {}", id)));
            }
        }

        let safe_name = sanitize_filename(&meta.file_name);
        let key = file_key(&safe_name, meta.total_chunks);

        let (target, created) = if meta.chunk_index == 0 {
            self.start_or_resume(&meta, &safe_name, key).await?
        } else {
            (self.resolve(&meta, &key).await?, false)
        };

        let overwrite = self.duplicate_policy == DuplicateChunkPolicy::Overwrite;
        if let Err(e) = self
            .chunks
            .write_chunk(&target.temp_dir, meta.chunk_index, payload, overwrite)
            .await
        {
            if created {
                // A failed first chunk leaves nothing behind
                self.sessions.remove(&target.upload_id).await;
                self.discard_temp(&target.temp_dir).await;
            }
            return Err(e.into());
        }

        self.sessions.touch(&target.upload_id).await;

        if meta.chunk_index + 1 == meta.total_chunks {
            let complete = self.finish(&meta, &safe_name, target).await?;
            return Ok(ChunkUploadResponse::Complete(complete));
        }

        tracing::debug!(
            upload_id = %target.upload_id,
            document_type = %target.document_type,
            category = ?meta.category,
            "Chunk stored"
        );

        Ok(ChunkUploadResponse::Partial(ChunkAck::new(
            target.upload_id,
            target.document_type,
        )))
    }

    /// Register a new session for chunk 0, or reuse the one named by `fileId`
    /// when chunk 0 is resent.
    async fn start_or_resume(
        &self,
        meta: &ChunkMeta,
        safe_name: &str,
        key: String,
    ) -> Result<(Target, bool), AppError> {
        if let Some(id) = meta.file_id.as_deref() {
            if let Some(session) = self.sessions.get(id).await {
                self.check_total(&session, meta.total_chunks)?;
                tracing::debug!(upload_id = %id, "Chunk 0 resent for existing upload");
                return Ok((
                    Target {
                        upload_id: session.upload_id.clone(),
                        temp_dir: session.temp_dir.clone(),
                        document_type: session.document_type,
                    },
                    false,
                ));
            }
        }

        let upload_id = format!("{}-{}", key, Uuid::new_v4().simple());
        let temp_dir = temp_dir_key(&upload_id);
        let session = UploadSession::new(
            upload_id.clone(),
            key,
            safe_name.to_string(),
            meta.document_type,
            meta.total_chunks,
            temp_dir.clone(),
        );
        self.sessions.create(session).await;

        tracing::info!(
            upload_id = %upload_id,
            document_type = %meta.document_type,
            total_chunks = meta.total_chunks,
            "Upload session started"
        );

        Ok((
            Target {
                upload_id,
                temp_dir,
                document_type: meta.document_type,
            },
            true,
        ))
    }

    /// Find the upload a later chunk belongs to.
    ///
    /// Prefers the session named by `fileId`, then the latest session for the
    /// file key. Without a session the chunk still lands in a deterministic temp
    /// directory under the default category, and a session is registered for
    /// that directory so cleanup and the idle sweep can reach it.
    async fn resolve(&self, meta: &ChunkMeta, key: &str) -> Result<Target, AppError> {
        let session = match meta.file_id.as_deref() {
            Some(id) => self.sessions.get(id).await,
            None => self.sessions.latest_for_key(key).await,
        };

        if let Some(session) = session {
            self.check_total(&session, meta.total_chunks)?;
            return Ok(Target {
                upload_id: session.upload_id.clone(),
                temp_dir: session.temp_dir.clone(),
                document_type: session.document_type,
            });
        }

        let upload_id = meta.file_id.clone().unwrap_or_else(|| key.to_string());
        tracing::warn!(
            upload_id = %upload_id,
            chunk_index = meta.chunk_index,
            "No upload session found, falling back to default category"
        );

        // Keyed by its own id so the index entry of a live upload for the same
        // file name is left alone
        let temp_dir = temp_dir_key(&upload_id);
        let session = UploadSession::new(
            upload_id.clone(),
            upload_id.clone(),
            sanitize_filename(&meta.file_name),
            DocumentType::default(),
            meta.total_chunks,
            temp_dir.clone(),
        );
        self.sessions.create(session).await;

        Ok(Target {
            upload_id,
            temp_dir,
            document_type: DocumentType::default(),
        })
    }

    fn check_total(&self, session: &UploadSession, total_chunks: u32) -> Result<(), AppError> {
        if session.total_chunks != total_chunks {
            return Err(AppError::InvalidInput(format!(
                "totalChunks {} does not match {} declared by chunk 0",
                total_chunks, session.total_chunks
            )));
        }
        Ok(())
    }

    /// Assemble the artifact and release the upload's temp storage
    async fn finish(
        &self,
        meta: &ChunkMeta,
        safe_name: &str,
        target: Target,
    ) -> Result<UploadComplete, AppError> {
        // Claim the session so a concurrent duplicate of the last chunk cannot
        // assemble a second time.
        let Some(claimed) = self.sessions.remove(&target.upload_id).await else {
            return Err(AppError::Conflict(format!(
                "Upload {} is already being completed",
                target.upload_id
            )));
        };

        let dest_key = artifact_key(target.document_type, safe_name);
        let size = match self
            .chunks
            .assemble(&target.temp_dir, meta.total_chunks, &dest_key)
            .await
        {
            Ok(size) => size,
            Err(e) => {
                // Keep the session so the missing chunk can still be sent
                self.sessions.restore(claimed).await;
                return Err(e.into());
            }
        };

        self.discard_temp(&target.temp_dir).await;

        let file_path = self.chunks.path_for(&dest_key)?.display().to_string();
        let complete = UploadComplete {
            message: "File uploaded successfully".to_string(),
            file_path,
            original_name: meta.file_name.clone(),
            size,
            file_id: target.upload_id,
            document_type: target.document_type,
            timestamp: Utc::now(),
        };

        tracing::info!(
            upload_id = %complete.file_id,
            file_path = %complete.file_path,
            size_bytes = size,
            document_type = %complete.document_type,
            "Upload completed"
        );

        if let Err(e) = self.recorder.record_document(&complete).await {
            tracing::error!(
                upload_id = %complete.file_id,
                error = %e,
                "Failed to record uploaded document"
            );
        }

        Ok(complete)
    }

    /// Best-effort temp removal; failures are logged only
    async fn discard_temp(&self, temp_dir: &str) {
        if let Err(e) = self.chunks.remove_upload(temp_dir).await {
            tracing::warn!(temp_dir = %temp_dir, error = %e, "Failed to remove upload temp directory");
        }
    }

    /// Remove one upload's temp directory and session, or every upload when
    /// `upload_id` is `None`. Already-clean targets succeed.
    pub async fn cleanup(&self, upload_id: Option<&str>) -> Result<(), AppError> {
        match upload_id {
            Some(id) => {
                if !is_valid_upload_id(id) {
                    return Err(AppError::InvalidInput(format!("Invalid fileId: {}", id)));
                }
                let temp_dir = match self.sessions.remove(id).await {
                    Some(session) => session.temp_dir,
                    None => temp_dir_key(id),
                };
                self.chunks.remove_upload(&temp_dir).await.map_err(|e| match e {
                    StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
                    other => other.into(),
                })?;
                tracing::info!(upload_id = %id, "Upload cleaned up");
            }
            None => {
                self.sessions.clear().await;
                self.chunks.clear_temp().await?;
                tracing::info!("All in-flight uploads cleaned up");
            }
        }
        Ok(())
    }

    /// Clean up every session idle for longer than `ttl`. Returns how many were removed.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let mut removed = 0;
        for id in self.sessions.idle_since(cutoff).await {
            match self.cleanup(Some(&id)).await {
                Ok(()) => removed += 1,
                Err(e) => {
                    tracing::error!(upload_id = %id, error = %e, "Failed to sweep idle upload");
                }
            }
        }
        removed
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }
}
