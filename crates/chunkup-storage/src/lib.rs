//! Chunkup Storage Library
//!
//! Storage abstractions for chunked uploads: the on-disk chunk store and the
//! upload session store.
//!
//! # Storage key format
//!
//! All keys are relative to the storage root:
//!
//! - **In-flight chunks**: `temp/{upload_id}/chunk_{index}`
//! - **Finished artifacts**: `{document_type_lowercase}/{file_name}`
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module.

pub mod keys;
pub mod local;
pub mod session;
pub mod traits;

pub use local::LocalChunkStore;
pub use session::InMemorySessionStore;
pub use traits::{ChunkStore, SessionStore, StorageError, StorageResult};
