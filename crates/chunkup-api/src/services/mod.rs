pub mod reassembler;
pub mod sweeper;

pub use reassembler::{ChunkMeta, ChunkReassembler};
pub use sweeper::SessionSweeper;
