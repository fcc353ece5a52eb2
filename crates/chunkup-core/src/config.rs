//! Configuration module
//!
//! Server configuration is read from the environment (optionally seeded from a
//! `.env` file) and validated once at startup.

use std::env;
use std::str::FromStr;

const SERVER_PORT: u16 = 4000;
const MAX_CHUNK_SIZE_MB: usize = 10;
const MAX_TOTAL_CHUNKS: u32 = 10_000;
const UPLOAD_SESSION_TTL_SECS: u64 = 86_400;
const UPLOAD_SWEEP_INTERVAL_SECS: u64 = 3_600;
const SESSION_STORE_SHARDS: usize = 16;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// What to do when a chunk index arrives a second time for the same upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DuplicateChunkPolicy {
    /// Last write wins
    #[default]
    Overwrite,
    /// Refuse the second write with a conflict
    Reject,
}

impl FromStr for DuplicateChunkPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overwrite" => Ok(DuplicateChunkPolicy::Overwrite),
            "reject" => Ok(DuplicateChunkPolicy::Reject),
            other => Err(anyhow::anyhow!(
                "DUPLICATE_CHUNK_POLICY must be 'overwrite' or 'reject', got '{}'",
                other
            )),
        }
    }
}

/// Base configuration shared by every HTTP-facing binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub request_timeout_secs: u64,
}

/// Chunked upload service configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    /// Root directory for both temp chunks and final artifacts
    pub storage_path: String,
    pub max_chunk_size_bytes: usize,
    pub max_total_chunks: u32,
    /// Idle time after which an unfinished upload is swept. 0 = disabled.
    pub session_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub duplicate_chunk_policy: DuplicateChunkPolicy,
    pub session_store_shards: usize,
    /// Exposes `POST /uploads/cleanup/all`
    pub maintenance_endpoints_enabled: bool,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn as_upload(&self) -> &UploadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_upload().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_upload().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_upload().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().base.environment
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.as_upload().base.request_timeout_secs
    }

    pub fn storage_path(&self) -> &str {
        &self.as_upload().storage_path
    }

    pub fn max_chunk_size_bytes(&self) -> usize {
        self.as_upload().max_chunk_size_bytes
    }

    pub fn max_total_chunks(&self) -> u32 {
        self.as_upload().max_total_chunks
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.as_upload().session_ttl_secs
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.as_upload().sweep_interval_secs
    }

    pub fn duplicate_chunk_policy(&self) -> DuplicateChunkPolicy {
        self.as_upload().duplicate_chunk_policy
    }

    pub fn session_store_shards(&self) -> usize {
        self.as_upload().session_store_shards
    }

    pub fn maintenance_endpoints_enabled(&self) -> bool {
        self.as_upload().maintenance_endpoints_enabled
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

impl UploadServiceConfig {
    /// Defaults used when no environment is present. Handy for tests.
    pub fn with_storage_path(storage_path: impl Into<String>) -> Self {
        UploadServiceConfig {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
                request_timeout_secs: REQUEST_TIMEOUT_SECS,
            },
            storage_path: storage_path.into(),
            max_chunk_size_bytes: MAX_CHUNK_SIZE_MB * 1024 * 1024,
            max_total_chunks: MAX_TOTAL_CHUNKS,
            session_ttl_secs: UPLOAD_SESSION_TTL_SECS,
            sweep_interval_secs: UPLOAD_SWEEP_INTERVAL_SECS,
            duplicate_chunk_policy: DuplicateChunkPolicy::Overwrite,
            session_store_shards: SESSION_STORE_SHARDS,
            maintenance_endpoints_enabled: false,
        }
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        };

        let duplicate_chunk_policy = match env::var("DUPLICATE_CHUNK_POLICY") {
            Ok(value) => value.parse()?,
            Err(_) => DuplicateChunkPolicy::default(),
        };

        let config = UploadServiceConfig {
            base,
            storage_path: env::var("STORAGE_PATH").unwrap_or_else(|_| "storage".to_string()),
            max_chunk_size_bytes: env::var("MAX_CHUNK_SIZE_MB")
                .unwrap_or_else(|_| MAX_CHUNK_SIZE_MB.to_string())
                .parse::<usize>()
                .unwrap_or(MAX_CHUNK_SIZE_MB)
                * 1024
                * 1024,
            max_total_chunks: env::var("MAX_TOTAL_CHUNKS")
                .unwrap_or_else(|_| MAX_TOTAL_CHUNKS.to_string())
                .parse()
                .unwrap_or(MAX_TOTAL_CHUNKS),
            session_ttl_secs: env::var("UPLOAD_SESSION_TTL_SECS")
                .unwrap_or_else(|_| UPLOAD_SESSION_TTL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_SESSION_TTL_SECS),
            sweep_interval_secs: env::var("UPLOAD_SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| UPLOAD_SWEEP_INTERVAL_SECS.to_string())
                .parse()
                .unwrap_or(UPLOAD_SWEEP_INTERVAL_SECS),
            duplicate_chunk_policy,
            session_store_shards: env::var("SESSION_STORE_SHARDS")
                .unwrap_or_else(|_| SESSION_STORE_SHARDS.to_string())
                .parse()
                .unwrap_or(SESSION_STORE_SHARDS),
            maintenance_endpoints_enabled: env::var("MAINTENANCE_ENDPOINTS_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.storage_path.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_PATH must not be empty"));
        }

        if self.max_chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_CHUNK_SIZE_MB must be at least 1"));
        }

        if self.max_total_chunks == 0 {
            return Err(anyhow::anyhow!("MAX_TOTAL_CHUNKS must be at least 1"));
        }

        if self.session_ttl_secs > 0 && self.sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "UPLOAD_SWEEP_INTERVAL_SECS must be greater than 0 when UPLOAD_SESSION_TTL_SECS is set"
            ));
        }

        if self.session_store_shards == 0 {
            return Err(anyhow::anyhow!("SESSION_STORE_SHARDS must be at least 1"));
        }

        if self.maintenance_endpoints_enabled && is_production_env(&self.base.environment) {
            tracing::warn!("MAINTENANCE_ENDPOINTS_ENABLED is on in production; global cleanup is reachable");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = UploadServiceConfig::with_storage_path("storage");
        assert!(config.validate().is_ok());
        assert_eq!(config.max_chunk_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.duplicate_chunk_policy, DuplicateChunkPolicy::Overwrite);
    }

    #[test]
    fn test_empty_storage_path_rejected() {
        let config = UploadServiceConfig::with_storage_path("  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ttl_requires_sweep_interval() {
        let mut config = UploadServiceConfig::with_storage_path("storage");
        config.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        config.session_ttl_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_duplicate_policy_parse() {
        assert_eq!(
            "Reject".parse::<DuplicateChunkPolicy>().unwrap(),
            DuplicateChunkPolicy::Reject
        );
        assert_eq!(
            " overwrite ".parse::<DuplicateChunkPolicy>().unwrap(),
            DuplicateChunkPolicy::Overwrite
        );
        assert!("append".parse::<DuplicateChunkPolicy>().is_err());
    }

    #[test]
    fn test_is_production() {
        let mut inner = UploadServiceConfig::with_storage_path("storage");
        inner.base.environment = "PROD".to_string();
        assert!(Config(Box::new(inner)).is_production());
    }
}
