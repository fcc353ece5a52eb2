use thiserror::Error;

/// Why a chunked upload stopped before producing an artifact
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Chunk {index} rejected with status {status}: {message}")]
    Status {
        index: u32,
        status: u16,
        message: String,
    },

    #[error("Chunk {index}: malformed server response: {message}")]
    MalformedResponse { index: u32, message: String },

    #[error("Chunk {index}: transport error: {source}")]
    Transport {
        index: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read chunk {index} from source: {source}")]
    Io {
        index: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload aborted")]
    Aborted,
}

impl UploadError {
    /// Index of the chunk that failed, if the failure is tied to one
    pub fn chunk_index(&self) -> Option<u32> {
        match self {
            UploadError::Status { index, .. }
            | UploadError::MalformedResponse { index, .. }
            | UploadError::Transport { index, .. }
            | UploadError::Io { index, .. } => Some(*index),
            UploadError::Aborted => None,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, UploadError::Aborted)
    }
}
