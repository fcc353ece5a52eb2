//! Application setup and initialization

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::services::{ChunkReassembler, SessionSweeper};
use crate::state::AppState;
use crate::telemetry::LogFormat;
use anyhow::{Context, Result};
use chunkup_core::{Config, NoOpDocumentRecorder};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .map(|s| s.parse::<LogFormat>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid LOG_FORMAT: {}", e))?
        .unwrap_or_default();
    crate::telemetry::init_telemetry(log_format, config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    validation::validate_config(&config).context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    let state = build_state(&config).await?;
    start_sweeper(&config, &state);

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Wire storage, session store and the reassembler into application state.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let (chunks, sessions) = storage::setup_storage(config).await?;

    let reassembler = Arc::new(ChunkReassembler::new(
        chunks,
        sessions,
        Arc::new(NoOpDocumentRecorder),
        config.duplicate_chunk_policy(),
    ));

    Ok(Arc::new(AppState::new(config.clone(), reassembler)))
}

fn start_sweeper(config: &Config, state: &Arc<AppState>) {
    if config.session_ttl_secs() == 0 {
        tracing::info!("Upload session sweep disabled (UPLOAD_SESSION_TTL_SECS=0)");
        return;
    }

    let sweeper = Arc::new(SessionSweeper::new(
        state.uploads.reassembler.clone(),
        Duration::from_secs(config.session_ttl_secs()),
        Duration::from_secs(config.sweep_interval_secs()),
    ));
    sweeper.start();

    tracing::info!(
        ttl_secs = config.session_ttl_secs(),
        interval_secs = config.sweep_interval_secs(),
        "Upload session sweeper started"
    );
}
