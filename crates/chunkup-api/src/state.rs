use crate::services::ChunkReassembler;
use chunkup_core::Config;
use std::sync::Arc;

/// Limits applied while parsing a chunk request
#[derive(Clone, Copy, Debug)]
pub struct UploadLimits {
    pub max_chunk_size_bytes: usize,
    pub max_total_chunks: u32,
}

/// Reassembly service plus the limits its handlers enforce.
#[derive(Clone)]
pub struct UploadState {
    pub reassembler: Arc<ChunkReassembler>,
    pub limits: UploadLimits,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadState,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, reassembler: Arc<ChunkReassembler>) -> Self {
        let limits = UploadLimits {
            max_chunk_size_bytes: config.max_chunk_size_bytes(),
            max_total_chunks: config.max_total_chunks(),
        };
        Self {
            uploads: UploadState {
                reassembler,
                limits,
            },
            config,
        }
    }
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for UploadState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.uploads.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
