//! Storage abstraction traits
//!
//! [`ChunkStore`] owns the bytes of in-flight chunks and finished artifacts.
//! [`SessionStore`] owns the bookkeeping for in-progress uploads. The two are
//! kept apart so a session store can live outside the process while chunks stay
//! on local disk.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use chunkup_core::models::UploadSession;
use chunkup_core::AppError;
use std::path::PathBuf;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Chunk {index} already received")]
    ChunkExists { index: u32 },

    #[error("Chunk {index} is missing")]
    MissingChunk { index: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ChunkExists { index } => {
                AppError::Conflict(format!("Chunk {} was already received", index))
            }
            StorageError::MissingChunk { index } => AppError::BadRequest(format!(
                "Cannot assemble upload: chunk {} was never received",
                index
            )),
            StorageError::WriteFailed(msg)
            | StorageError::ReadFailed(msg)
            | StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Byte storage for chunk files and assembled artifacts.
///
/// `temp_dir` arguments are storage keys produced by [`crate::keys::temp_dir_key`].
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Write one chunk payload verbatim. With `overwrite == false` an existing
    /// chunk for the same index fails with [`StorageError::ChunkExists`].
    async fn write_chunk(
        &self,
        temp_dir: &str,
        index: u32,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<()>;

    /// Concatenate chunks `0..total_chunks` in index order into `dest_key`.
    ///
    /// The destination only becomes visible once every chunk has been copied.
    /// Returns the artifact size in bytes.
    async fn assemble(&self, temp_dir: &str, total_chunks: u32, dest_key: &str)
        -> StorageResult<u64>;

    /// Remove an upload's temp directory. A missing directory is already clean.
    async fn remove_upload(&self, temp_dir: &str) -> StorageResult<()>;

    /// Remove the whole temp root, including every in-flight upload
    async fn clear_temp(&self) -> StorageResult<()>;

    /// Filesystem path for a storage key, as reported to clients
    fn path_for(&self, key: &str) -> StorageResult<PathBuf>;
}

/// Store of in-progress upload sessions keyed by upload identifier.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Record a new session and mark it as the latest for its file key
    async fn create(&self, session: UploadSession);

    /// Put a previously removed session back. Unlike [`SessionStore::create`]
    /// it stays out of the way of a newer session for the same file key.
    async fn restore(&self, session: UploadSession);

    async fn get(&self, upload_id: &str) -> Option<UploadSession>;

    /// Most recently created session for a filename-derived key
    async fn latest_for_key(&self, file_key: &str) -> Option<UploadSession>;

    /// Refresh a session's last activity time. Returns false if unknown.
    async fn touch(&self, upload_id: &str) -> bool;

    /// Forget a session, returning it if it existed
    async fn remove(&self, upload_id: &str) -> Option<UploadSession>;

    /// Forget every session
    async fn clear(&self);

    /// Identifiers of sessions with no activity since `cutoff`
    async fn idle_since(&self, cutoff: DateTime<Utc>) -> Vec<String>;

    /// Number of live sessions
    async fn len(&self) -> usize;
}
