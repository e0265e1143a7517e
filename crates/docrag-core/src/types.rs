//! Core domain types for DocRAG.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Topic assigned to files that sit directly under the documents root.
pub const GENERAL_TOPIC: &str = "general";

/// Unique identifier for chunks.
pub type ChunkId = String;

/// Generate a new unique ID.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Kind of document the pipeline knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Text => "txt",
        }
    }

    /// Detect document kind from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::Text),
            _ => None,
        }
    }

    /// Detect document kind from a path's extension.
    pub fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata attached to every text unit and every chunk derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub topic: String,
    pub source_file: String,
    pub source_path: String,
}

impl ChunkMetadata {
    pub fn new(
        topic: impl Into<String>,
        source_file: impl Into<String>,
        source_path: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            source_file: source_file.into(),
            source_path: source_path.into(),
        }
    }
}

/// One extracted span of text (a page, or a whole file) with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl TextUnit {
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A text window handed to the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub ordinal: usize,
    pub content: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(ordinal: usize, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: new_id(),
            ordinal,
            content: content.into(),
            metadata,
        }
    }
}

/// A chunk returned by similarity search together with its relevance score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Catalogue entry for one successfully ingested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub file_name: String,
    pub topic: String,
    pub source_path: PathBuf,
    pub size_bytes: u64,
    pub ingested_at: DateTime<Utc>,
}

/// Why a file was not ingested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The path was already ingested (or is being ingested) in this process.
    Duplicate,
    /// The extension is not one of pdf, docx, txt.
    UnsupportedType(String),
    /// Extraction produced no text.
    EmptyText,
    /// Extraction or indexing failed.
    Failed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Duplicate => write!(f, "already ingested"),
            SkipReason::UnsupportedType(ext) => write!(f, "unsupported file type: {}", ext),
            SkipReason::EmptyText => write!(f, "no text extracted"),
            SkipReason::Failed(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// Result of one `ingest` call.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Ingested(DocumentRecord),
    Skipped(SkipReason),
}

impl IngestOutcome {
    pub fn is_ingested(&self) -> bool {
        matches!(self, IngestOutcome::Ingested(_))
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            IngestOutcome::Skipped(reason) => Some(reason),
            IngestOutcome::Ingested(_) => None,
        }
    }
}

/// Preview of a retrieved chunk shown alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceExcerpt {
    pub source_file: String,
    pub excerpt: String,
}

impl std::fmt::Display for SourceExcerpt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.source_file, self.excerpt)
    }
}

/// Answer to a question, always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceExcerpt>,
    pub applied_filter: Option<String>,
}
