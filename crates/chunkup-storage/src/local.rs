use crate::keys::{chunk_key, TEMP_ROOT};
use crate::traits::{ChunkStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Local filesystem chunk store
#[derive(Clone)]
pub struct LocalChunkStore {
    base_path: PathBuf,
}

impl LocalChunkStore {
    /// Create a new LocalChunkStore rooted at `base_path` (e.g. "storage")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalChunkStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path, refusing anything that could
    /// escape the storage root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        } else if path.strip_prefix(&self.base_path).is_err() {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Unique hidden sibling of `path`; the name prefix is capped so long
    /// artifact names stay within filesystem limits
    fn scratch_path(path: &Path, suffix: &str) -> PathBuf {
        let name: String = path
            .file_name()
            .map(|n| n.to_string_lossy().chars().take(64).collect())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.{}", name, Uuid::new_v4().simple(), suffix))
    }

    async fn copy_chunks(
        &self,
        temp_dir: &str,
        total_chunks: u32,
        part_path: &Path,
    ) -> StorageResult<u64> {
        let mut out = fs::File::create(part_path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to create file {}: {}",
                part_path.display(),
                e
            ))
        })?;

        let mut size = 0u64;
        for index in 0..total_chunks {
            let chunk_path = self.key_to_path(&chunk_key(temp_dir, index))?;
            let mut chunk = match fs::File::open(&chunk_path).await {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(StorageError::MissingChunk { index });
                }
                Err(e) => {
                    return Err(StorageError::ReadFailed(format!(
                        "Failed to open chunk {}: {}",
                        chunk_path.display(),
                        e
                    )));
                }
            };

            size += tokio::io::copy(&mut chunk, &mut out).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to append chunk {} to {}: {}",
                    index,
                    part_path.display(),
                    e
                ))
            })?;
        }

        out.flush().await?;
        out.sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync file {}: {}",
                part_path.display(),
                e
            ))
        })?;

        Ok(size)
    }
}

#[async_trait]
impl ChunkStore for LocalChunkStore {
    async fn write_chunk(
        &self,
        temp_dir: &str,
        index: u32,
        data: Bytes,
        overwrite: bool,
    ) -> StorageResult<()> {
        let key = chunk_key(temp_dir, index);
        let path = self.key_to_path(&key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        if overwrite {
            let scratch = Self::scratch_path(&path, "tmp");
            let mut file = fs::File::create(&scratch).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    scratch.display(),
                    e
                ))
            })?;
            if let Err(e) = file.write_all(&data).await {
                let _ = fs::remove_file(&scratch).await;
                return Err(StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    scratch.display(),
                    e
                )));
            }
            file.sync_all().await?;
            drop(file);
            fs::rename(&scratch, &path).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to move {} into place: {}",
                    scratch.display(),
                    e
                ))
            })?;
        } else {
            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    return Err(StorageError::ChunkExists { index });
                }
                Err(e) => {
                    return Err(StorageError::WriteFailed(format!(
                        "Failed to create file {}: {}",
                        path.display(),
                        e
                    )));
                }
            };
            file.write_all(&data).await.map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            file.sync_all().await?;
        }

        tracing::debug!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Chunk written"
        );

        Ok(())
    }

    async fn assemble(
        &self,
        temp_dir: &str,
        total_chunks: u32,
        dest_key: &str,
    ) -> StorageResult<u64> {
        let dest_path = self.key_to_path(dest_key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&dest_path).await?;

        let part_path = Self::scratch_path(&dest_path, "part");
        let size = match self.copy_chunks(temp_dir, total_chunks, &part_path).await {
            Ok(size) => size,
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&part_path).await {
                    if remove_err.kind() != ErrorKind::NotFound {
                        tracing::warn!(
                            path = %part_path.display(),
                            error = %remove_err,
                            "Failed to remove partial artifact"
                        );
                    }
                }
                return Err(e);
            }
        };

        fs::rename(&part_path, &dest_path).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to move {} to {}: {}",
                part_path.display(),
                dest_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %dest_path.display(),
            key = %dest_key,
            chunks = total_chunks,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Artifact assembled"
        );

        Ok(size)
    }

    async fn remove_upload(&self, temp_dir: &str) -> StorageResult<()> {
        let path = self.key_to_path(temp_dir)?;
        let start = std::time::Instant::now();

        match fs::remove_dir_all(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete directory {}: {}",
                    path.display(),
                    e
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %temp_dir,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload temp directory removed"
        );

        Ok(())
    }

    async fn clear_temp(&self) -> StorageResult<()> {
        let path = self.base_path.join(TEMP_ROOT);

        match fs::remove_dir_all(&path).await {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Temp root cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete directory {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        self.key_to_path(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{artifact_key, temp_dir_key};
    use chunkup_core::DocumentType;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_assemble_in_index_order() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();
        let temp = temp_dir_key("doc.txt-3-a");

        store.write_chunk(&temp, 2, Bytes::from_static(b"C"), true).await.unwrap();
        store.write_chunk(&temp, 0, Bytes::from_static(b"AA"), true).await.unwrap();
        store.write_chunk(&temp, 1, Bytes::from_static(b"B"), true).await.unwrap();

        let dest = artifact_key(DocumentType::Hello, "doc.txt");
        let size = store.assemble(&temp, 3, &dest).await.unwrap();

        assert_eq!(size, 4);
        let written = std::fs::read(dir.path().join("hello/doc.txt")).unwrap();
        assert_eq!(written, b"AABC");
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();
        let temp = temp_dir_key("x-1-a");

        store.write_chunk(&temp, 0, Bytes::from_static(b"first"), true).await.unwrap();
        store.write_chunk(&temp, 0, Bytes::from_static(b"second"), true).await.unwrap();

        store.assemble(&temp, 1, "hello/x").await.unwrap();
        assert_eq!(std::fs::read(dir.path().join("hello/x")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_reject_duplicate_chunk() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();
        let temp = temp_dir_key("x-2-a");

        store.write_chunk(&temp, 1, Bytes::from_static(b"one"), false).await.unwrap();
        let result = store.write_chunk(&temp, 1, Bytes::from_static(b"two"), false).await;
        assert!(matches!(result, Err(StorageError::ChunkExists { index: 1 })));
        assert_eq!(std::fs::read(dir.path().join(&temp).join("chunk_1")).unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_missing_chunk_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();
        let temp = temp_dir_key("gap-3-a");

        store.write_chunk(&temp, 0, Bytes::from_static(b"a"), true).await.unwrap();
        store.write_chunk(&temp, 2, Bytes::from_static(b"c"), true).await.unwrap();

        let result = store.assemble(&temp, 3, "thesis/gap").await;
        assert!(matches!(result, Err(StorageError::MissingChunk { index: 1 })));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("thesis"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_remove_upload_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();
        let temp = temp_dir_key("gone-1-a");

        store.write_chunk(&temp, 0, Bytes::from_static(b"a"), true).await.unwrap();
        store.remove_upload(&temp).await.unwrap();
        assert!(!dir.path().join(&temp).exists());

        store.remove_upload(&temp).await.unwrap();
        store.remove_upload(&temp_dir_key("never-existed")).await.unwrap();
    }

    #[tokio::test]
    async fn test_clear_temp_keeps_artifacts() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();

        store.write_chunk("temp/a", 0, Bytes::from_static(b"a"), true).await.unwrap();
        store.write_chunk("temp/b", 0, Bytes::from_static(b"b"), true).await.unwrap();
        store.assemble("temp/b", 1, "synergy/b").await.unwrap();

        store.clear_temp().await.unwrap();
        store.clear_temp().await.unwrap();

        assert!(!dir.path().join(TEMP_ROOT).exists());
        assert!(dir.path().join("synergy/b").exists());
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalChunkStore::new(dir.path()).await.unwrap();

        let result = store.remove_upload("../../etc").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store
            .write_chunk("/etc", 0, Bytes::from_static(b"x"), true)
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));

        let result = store.assemble("temp/a", 1, "../outside").await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }
}
