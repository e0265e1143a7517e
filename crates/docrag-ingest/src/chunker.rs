//! Token-window chunking for retrieval.
//!
//! Text is tokenized on whitespace. Consecutive text units that share the same
//! metadata (the pages or paragraphs of one file) are concatenated and cut into
//! windows of `chunk_size` tokens, each window starting `chunk_overlap` tokens
//! before the end of the previous one.

use crate::error::{IngestError, IngestResult};
use docrag_core::{Chunk, ChunkMetadata, TextUnit};

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Window size in tokens.
    pub chunk_size: usize,
    /// Tokens shared by adjacent windows. Must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
    /// A trailing window with fewer characters than this is dropped.
    pub min_chunk_chars: usize,
    /// Hard cap on the number of chunks produced by one `split` call.
    pub max_chunks: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 100,
            min_chunk_chars: 5,
            max_chunks: 10_000,
        }
    }
}

impl ChunkConfig {
    /// Create config from processing settings.
    pub fn from_processing_config(config: &docrag_config::ProcessingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            min_chunk_chars: config.min_chunk_chars,
            max_chunks: config.max_chunks,
        }
    }
}

/// Splits text units into overlapping token windows.
#[derive(Debug, Clone)]
pub struct ChunkSplitter {
    config: ChunkConfig,
}

impl ChunkSplitter {
    /// Create a splitter, rejecting configurations that cannot make progress.
    pub fn new(config: ChunkConfig) -> IngestResult<Self> {
        if config.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split text units into chunks, in input order.
    ///
    /// Metadata of each unit is copied to every chunk derived from it. Ordinals
    /// run from zero across the whole output. Output stops silently at
    /// `max_chunks`.
    pub fn split(&self, units: &[TextUnit]) -> Vec<Chunk> {
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();

        for (metadata, words) in group_by_metadata(units) {
            if words.is_empty() {
                continue;
            }

            let mut start = 0;
            loop {
                if chunks.len() >= self.config.max_chunks {
                    return chunks;
                }

                let end = (start + self.config.chunk_size).min(words.len());
                let content = words[start..end].join(" ");
                let is_last = end == words.len();

                if !is_last || content.chars().count() >= self.config.min_chunk_chars {
                    chunks.push(Chunk::new(chunks.len(), content, metadata.clone()));
                }

                if is_last {
                    break;
                }
                start += step;
            }
        }

        chunks
    }
}

/// Concatenate the words of consecutive units that carry identical metadata.
fn group_by_metadata(units: &[TextUnit]) -> Vec<(&ChunkMetadata, Vec<&str>)> {
    let mut groups: Vec<(&ChunkMetadata, Vec<&str>)> = Vec::new();

    for unit in units {
        match groups.last_mut() {
            Some((metadata, words)) if **metadata == unit.metadata => {
                words.extend(unit.text.split_whitespace());
            }
            _ => groups.push((&unit.metadata, unit.text.split_whitespace().collect())),
        }
    }

    groups
}
