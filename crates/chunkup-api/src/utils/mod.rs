pub mod upload;

pub use upload::{extract_chunk_form, sanitize_filename, ChunkForm};
