use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use super::reassembler::ChunkReassembler;

/// Background task reclaiming uploads abandoned without a cleanup call
#[derive(Clone)]
pub struct SessionSweeper {
    reassembler: Arc<ChunkReassembler>,
    ttl: Duration,
    every: Duration,
}

impl SessionSweeper {
    pub fn new(reassembler: Arc<ChunkReassembler>, ttl: Duration, every: Duration) -> Self {
        Self {
            reassembler,
            ttl,
            every,
        }
    }

    /// Start the sweep loop. Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.every);
            // First tick fires immediately; nothing can be idle yet
            sweep_interval.tick().await;

            loop {
                sweep_interval.tick().await;
                self.sweep_once().await;
            }
        })
    }

    #[tracing::instrument(skip(self), fields(ttl_secs = self.ttl.as_secs()))]
    pub async fn sweep_once(&self) -> usize {
        let removed = self.reassembler.sweep_idle(self.ttl).await;
        if removed > 0 {
            tracing::info!(removed, "Swept idle uploads");
        } else {
            tracing::debug!("No idle uploads to sweep");
        }
        removed
    }
}
