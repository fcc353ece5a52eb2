pub mod document_type;
pub mod upload;

pub use document_type::{DocumentType, UnknownDocumentType};
pub use upload::{
    ChunkAck, ChunkUploadResponse, CleanupRequest, CleanupResponse, UploadComplete, UploadSession,
};
