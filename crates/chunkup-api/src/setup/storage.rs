//! Storage setup and initialization

use anyhow::{Context, Result};
use chunkup_core::Config;
use chunkup_storage::{ChunkStore, InMemorySessionStore, LocalChunkStore, SessionStore};
use std::sync::Arc;

/// Create the chunk store rooted at `STORAGE_PATH` and the in-process session store.
pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn ChunkStore>, Arc<dyn SessionStore>)> {
    tracing::info!(storage_path = %config.storage_path(), "Initializing chunk storage...");

    let chunks = LocalChunkStore::new(config.storage_path())
        .await
        .with_context(|| format!("Failed to open storage at {}", config.storage_path()))?;
    let sessions = InMemorySessionStore::with_shards(config.session_store_shards());

    tracing::info!(
        base_path = %chunks.base_path().display(),
        session_shards = config.session_store_shards(),
        "Chunk storage initialized successfully"
    );

    Ok((Arc::new(chunks), Arc::new(sessions)))
}
