//! Collaborator interfaces consumed by the ingestion and retrieval pipeline.
//!
//! The pipeline never embeds text or runs inference itself. It reaches those
//! capabilities only through the traits below, so every implementation must be
//! `Send + Sync`: the watcher thread and request threads share them.

use crate::error::Result;
use crate::types::{Chunk, ScoredChunk};
use std::path::Path;

/// Reads a file into an ordered sequence of text units (pages, paragraphs).
pub trait TextExtractor: Send + Sync {
    /// Extract text from a file. May return an empty vector for a file with no text.
    fn extract(&self, path: &Path) -> Result<Vec<String>>;
}

/// Stores chunks and answers similarity queries. Embedding is internal to it.
pub trait VectorIndex: Send + Sync {
    /// Write a batch of chunks. Must be synchronous: once this returns `Ok`,
    /// the chunks are searchable.
    fn add(&self, chunks: Vec<Chunk>) -> Result<()>;

    /// Top-`top_k` chunks most similar to `query`, by descending relevance,
    /// restricted to chunks whose topic equals `topic` when one is given.
    fn search(&self, query: &str, top_k: usize, topic: Option<&str>) -> Result<Vec<ScoredChunk>>;
}

/// Turns text into a vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Name of the embedding model, stored alongside each vector.
    fn model_name(&self) -> &str;
}

/// Produces an answer from a system instruction and a user message.
pub trait AnswerGenerator: Send + Sync {
    fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String>;
}
