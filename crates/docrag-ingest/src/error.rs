//! Error types for the ingestion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid chunking configuration: {0}")]
    InvalidChunkConfig(String),

    #[error("Documents root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Parse error for {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Watch error: {0}")]
    WatchError(String),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
}

impl From<notify::Error> for IngestError {
    fn from(err: notify::Error) -> Self {
        IngestError::WatchError(err.to_string())
    }
}

impl From<IngestError> for docrag_core::Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Io(e) => docrag_core::Error::Io(e),
            other => docrag_core::Error::Extraction(other.to_string()),
        }
    }
}
