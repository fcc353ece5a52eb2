//! In-process upload session store
//!
//! Sessions and the file-key index live in separate sharded maps. Every lock is
//! held only for a single map operation and never across I/O, so unrelated
//! uploads rarely contend.

use crate::traits::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chunkup_core::models::UploadSession;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;

type Shard<V> = Arc<Mutex<HashMap<String, V>>>;

fn new_shards<V>(count: usize) -> Vec<Shard<V>> {
    (0..count)
        .map(|_| Arc::new(Mutex::new(HashMap::new())))
        .collect()
}

/// Sharded in-memory [`SessionStore`] for a single server instance
#[derive(Clone)]
pub struct InMemorySessionStore {
    sessions: Vec<Shard<UploadSession>>,
    /// file key -> upload id of the latest session for that file
    latest: Vec<Shard<String>>,
    shard_count: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    /// Create a store with the default shard count (16 shards)
    pub fn new() -> Self {
        Self::with_shards(16)
    }

    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            sessions: new_shards(shard_count),
            latest: new_shards(shard_count),
            shard_count,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    fn session_shard(&self, upload_id: &str) -> &Shard<UploadSession> {
        &self.sessions[self.shard_index(upload_id)]
    }

    fn latest_shard(&self, file_key: &str) -> &Shard<String> {
        &self.latest[self.shard_index(file_key)]
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: UploadSession) {
        let upload_id = session.upload_id.clone();
        let file_key = session.file_key.clone();

        self.session_shard(&upload_id)
            .lock()
            .await
            .insert(upload_id.clone(), session);
        self.latest_shard(&file_key)
            .lock()
            .await
            .insert(file_key, upload_id);
    }

    async fn restore(&self, session: UploadSession) {
        let upload_id = session.upload_id.clone();
        let file_key = session.file_key.clone();
        let created_at = session.created_at;

        self.session_shard(&upload_id)
            .lock()
            .await
            .insert(upload_id.clone(), session);

        let current = self.latest_shard(&file_key).lock().await.get(&file_key).cloned();
        let newer_exists = match current {
            Some(id) if id != upload_id => self
                .get(&id)
                .await
                .is_some_and(|latest| latest.created_at >= created_at),
            _ => false,
        };

        if !newer_exists {
            self.latest_shard(&file_key)
                .lock()
                .await
                .insert(file_key, upload_id);
        }
    }

    async fn get(&self, upload_id: &str) -> Option<UploadSession> {
        self.session_shard(upload_id)
            .lock()
            .await
            .get(upload_id)
            .cloned()
    }

    async fn latest_for_key(&self, file_key: &str) -> Option<UploadSession> {
        let upload_id = self.latest_shard(file_key).lock().await.get(file_key).cloned()?;
        self.get(&upload_id).await
    }

    async fn touch(&self, upload_id: &str) -> bool {
        match self.session_shard(upload_id).lock().await.get_mut(upload_id) {
            Some(session) => {
                session.last_activity = Utc::now();
                true
            }
            None => false,
        }
    }

    async fn remove(&self, upload_id: &str) -> Option<UploadSession> {
        let removed = self.session_shard(upload_id).lock().await.remove(upload_id)?;

        let mut latest = self.latest_shard(&removed.file_key).lock().await;
        if latest.get(&removed.file_key).map(String::as_str) == Some(upload_id) {
            latest.remove(&removed.file_key);
        }

        Some(removed)
    }

    async fn clear(&self) {
        for shard in &self.sessions {
            shard.lock().await.clear();
        }
        for shard in &self.latest {
            shard.lock().await.clear();
        }
    }

    async fn idle_since(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        let mut idle = Vec::new();
        for shard in &self.sessions {
            let guard = shard.lock().await;
            idle.extend(
                guard
                    .values()
                    .filter(|s| s.last_activity < cutoff)
                    .map(|s| s.upload_id.clone()),
            );
        }
        idle
    }

    async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.sessions {
            total += shard.lock().await.len();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunkup_core::DocumentType;

    fn session(upload_id: &str, file_key: &str, document_type: DocumentType) -> UploadSession {
        UploadSession::new(
            upload_id.to_string(),
            file_key.to_string(),
            "a.pdf".to_string(),
            document_type,
            3,
            format!("temp/{}", upload_id),
        )
    }

    #[tokio::test]
    async fn test_latest_for_key_tracks_newest_session() {
        let store = InMemorySessionStore::with_shards(4);
        store.create(session("a.pdf-3-1", "a.pdf-3", DocumentType::Thesis)).await;
        store.create(session("a.pdf-3-2", "a.pdf-3", DocumentType::Synergy)).await;

        let latest = store.latest_for_key("a.pdf-3").await.unwrap();
        assert_eq!(latest.upload_id, "a.pdf-3-2");
        assert_eq!(latest.document_type, DocumentType::Synergy);

        // Older session stays addressable by id
        let older = store.get("a.pdf-3-1").await.unwrap();
        assert_eq!(older.document_type, DocumentType::Thesis);
    }

    #[tokio::test]
    async fn test_remove_keeps_newer_index_entry() {
        let store = InMemorySessionStore::new();
        store.create(session("k-1", "k", DocumentType::Hello)).await;
        store.create(session("k-2", "k", DocumentType::Hello)).await;

        assert!(store.remove("k-1").await.is_some());
        assert_eq!(store.latest_for_key("k").await.unwrap().upload_id, "k-2");

        assert!(store.remove("k-2").await.is_some());
        assert!(store.latest_for_key("k").await.is_none());
        assert!(store.remove("k-2").await.is_none());
    }

    #[tokio::test]
    async fn test_restore_does_not_displace_newer_session() {
        let store = InMemorySessionStore::new();
        store.create(session("k-old", "k", DocumentType::Thesis)).await;
        let old = store.remove("k-old").await.unwrap();

        store.create(session("k-new", "k", DocumentType::Synergy)).await;
        store.restore(old).await;

        assert_eq!(store.latest_for_key("k").await.unwrap().upload_id, "k-new");
        assert_eq!(
            store.get("k-old").await.unwrap().document_type,
            DocumentType::Thesis
        );
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_restore_reclaims_free_index_entry() {
        let store = InMemorySessionStore::new();
        store.create(session("k-1", "k", DocumentType::Hello)).await;
        let removed = store.remove("k-1").await.unwrap();
        assert!(store.latest_for_key("k").await.is_none());

        store.restore(removed).await;
        assert_eq!(store.latest_for_key("k").await.unwrap().upload_id, "k-1");
    }

    #[tokio::test]
    async fn test_idle_since_and_touch() {
        let store = InMemorySessionStore::new();
        store.create(session("old", "old", DocumentType::Hello)).await;

        let cutoff = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(store.idle_since(cutoff).await, vec!["old".to_string()]);

        let past = Utc::now() - chrono::Duration::seconds(60);
        assert!(store.idle_since(past).await.is_empty());

        assert!(store.touch("old").await);
        assert!(!store.touch("missing").await);
    }

    #[tokio::test]
    async fn test_clear_and_len() {
        let store = InMemorySessionStore::with_shards(2);
        for i in 0..10 {
            store
                .create(session(&format!("id-{}", i), &format!("key-{}", i), DocumentType::Hello))
                .await;
        }
        assert_eq!(store.len().await, 10);

        store.clear().await;
        assert_eq!(store.len().await, 0);
        assert!(store.latest_for_key("key-3").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_creates_do_not_collide() {
        let store = InMemorySessionStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(session(&format!("same-{}", i), "same", DocumentType::Hello))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.len().await, 32);
        assert!(store.latest_for_key("same").await.is_some());
    }
}
