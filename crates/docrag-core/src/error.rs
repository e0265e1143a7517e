//! Error types for DocRAG.

use thiserror::Error;

/// Core error type shared by the collaborator traits.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Index error: {0}")]
    Index(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using DocRAG's Error.
pub type Result<T> = std::result::Result<T, Error>;
