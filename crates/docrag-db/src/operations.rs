//! Chunk and vector operations.

pub mod chunks;
pub mod vectors;
