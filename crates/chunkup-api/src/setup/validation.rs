//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use chunkup_core::Config;

/// Upper bound on a single chunk; anything larger defeats chunking
const MAX_SANE_CHUNK_BYTES: usize = 1024 * 1024 * 1024;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    if config.is_production() && config.cors_origins().iter().any(|o| o == "*") {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if config.max_chunk_size_bytes() > MAX_SANE_CHUNK_BYTES {
        return Err(anyhow::anyhow!(
            "MAX_CHUNK_SIZE_MB is above 1024; a chunk that large must be split further"
        ));
    }

    if config.request_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS must be greater than 0"));
    }

    if config.session_ttl_secs() > 0 && config.session_ttl_secs() < config.sweep_interval_secs() {
        tracing::warn!(
            ttl_secs = config.session_ttl_secs(),
            interval_secs = config.sweep_interval_secs(),
            "UPLOAD_SWEEP_INTERVAL_SECS exceeds UPLOAD_SESSION_TTL_SECS; idle uploads may outlive their TTL"
        );
    }

    Ok(())
}
