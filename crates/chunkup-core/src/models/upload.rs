use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::document_type::DocumentType;

/// Server-side record of one in-progress chunked upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    /// Opaque upload identifier, returned to clients as `fileId`
    pub upload_id: String,
    /// Filename-derived key used to find the latest session for a file
    pub file_key: String,
    pub file_name: String,
    pub document_type: DocumentType,
    pub total_chunks: u32,
    /// Storage key of the temp directory holding chunk files
    pub temp_dir: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl UploadSession {
    pub fn new(
        upload_id: String,
        file_key: String,
        file_name: String,
        document_type: DocumentType,
        total_chunks: u32,
        temp_dir: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            upload_id,
            file_key,
            file_name,
            document_type,
            total_chunks,
            temp_dir,
            created_at: now,
            last_activity: now,
        }
    }
}

/// Acknowledgement for a non-final chunk
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkAck {
    /// Always "success"
    pub status: String,
    /// Always "Chunk received"
    pub message: String,
    pub is_partial: bool,
    pub document_type: DocumentType,
    /// Upload identifier to send with later chunks and cleanup calls
    pub file_id: String,
}

impl ChunkAck {
    pub fn new(file_id: String, document_type: DocumentType) -> Self {
        Self {
            status: "success".to_string(),
            message: "Chunk received".to_string(),
            is_partial: true,
            document_type,
            file_id,
        }
    }
}

/// Response for the final chunk once the artifact has been assembled
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadComplete {
    pub message: String,
    /// Path of the assembled artifact relative to the server working directory
    pub file_path: String,
    pub original_name: String,
    /// Artifact size in bytes
    pub size: u64,
    pub file_id: String,
    pub document_type: DocumentType,
    pub timestamp: DateTime<Utc>,
}

/// Either response shape of the chunk endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChunkUploadResponse {
    Complete(UploadComplete),
    Partial(ChunkAck),
}

impl ChunkUploadResponse {
    pub fn file_id(&self) -> &str {
        match self {
            ChunkUploadResponse::Complete(c) => &c.file_id,
            ChunkUploadResponse::Partial(a) => &a.file_id,
        }
    }
}

/// Body of the cleanup endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CleanupResponse {
    pub message: String,
}

impl CleanupResponse {
    pub fn success() -> Self {
        Self {
            message: "Cleanup successful".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_ack_wire_shape() {
        let ack = ChunkAck::new("report.pdf-3-abc".to_string(), DocumentType::Thesis);
        let value = serde_json::to_value(&ack).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["message"], "Chunk received");
        assert_eq!(value["isPartial"], true);
        assert_eq!(value["documentType"], "THESIS");
        assert_eq!(value["fileId"], "report.pdf-3-abc");
    }

    #[test]
    fn test_untagged_response_picks_complete() {
        let body = serde_json::json!({
            "message": "File uploaded successfully",
            "filePath": "storage/hello/a.bin",
            "originalName": "a.bin",
            "size": 10,
            "fileId": "a.bin-1-xyz",
            "documentType": "HELLO",
            "timestamp": "2026-01-01T00:00:00Z"
        });
        let parsed: ChunkUploadResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(parsed, ChunkUploadResponse::Complete(_)));
        assert_eq!(parsed.file_id(), "a.bin-1-xyz");
    }

    #[test]
    fn test_untagged_response_picks_partial() {
        let body = serde_json::json!({
            "status": "success",
            "message": "Chunk received",
            "isPartial": true,
            "documentType": "SYNERGY",
            "fileId": "b-2-xyz"
        });
        let parsed: ChunkUploadResponse = serde_json::from_value(body).unwrap();
        assert!(matches!(parsed, ChunkUploadResponse::Partial(_)));
    }

    #[test]
    fn test_cleanup_request_accepts_missing_file_id() {
        let req: CleanupRequest = serde_json::from_str("{}").unwrap();
        assert!(req.file_id.is_none());
    }
}
