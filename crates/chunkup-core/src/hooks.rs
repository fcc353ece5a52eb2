//! Hooks for collaborators outside the upload core
//!
//! The reassembler reports finished documents through [`DocumentRecorder`] so
//! that a host application can persist its own row per document without this
//! crate depending on a database.

use async_trait::async_trait;

use crate::models::UploadComplete;

/// Receives a notification for every assembled document
#[async_trait]
pub trait DocumentRecorder: Send + Sync {
    async fn record_document(&self, document: &UploadComplete) -> Result<(), String>;
}

/// Implementation used when no document registry is wired in
pub struct NoOpDocumentRecorder;

#[async_trait]
impl DocumentRecorder for NoOpDocumentRecorder {
    async fn record_document(&self, document: &UploadComplete) -> Result<(), String> {
        tracing::debug!(
            file_id = %document.file_id,
            file_path = %document.file_path,
            "No document recorder configured, skipping"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use chrono::Utc;

    #[tokio::test]
    async fn noop_recorder_accepts_everything() {
        let document = UploadComplete {
            message: "File uploaded successfully".to_string(),
            file_path: "storage/hello/a.txt".to_string(),
            original_name: "a.txt".to_string(),
            size: 3,
            file_id: "a.txt-1-abc".to_string(),
            document_type: DocumentType::Hello,
            timestamp: Utc::now(),
        };
        assert!(NoOpDocumentRecorder.record_document(&document).await.is_ok());
    }
}
