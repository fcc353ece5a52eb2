//! Chunkup API Library
//!
//! HTTP surface of the chunk reassembler: handlers, middleware and application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
mod telemetry;
pub mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use services::{ChunkMeta, ChunkReassembler, SessionSweeper};
pub use setup::routes::setup_routes;
pub use state::AppState;
