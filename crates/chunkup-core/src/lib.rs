//! Chunkup Core Library
//!
//! Document categories, wire types, error types and configuration shared by the
//! chunked upload server, client and CLI.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;

pub use config::{BaseConfig, Config, DuplicateChunkPolicy, UploadServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use hooks::{DocumentRecorder, NoOpDocumentRecorder};
pub use models::DocumentType;
