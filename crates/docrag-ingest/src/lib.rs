//! DocRAG Ingest - Turning a folder of documents into indexed chunks.
//!
//! This crate provides:
//! - A file system watcher that follows newly created sub-directories
//! - Text extraction for PDF, Word and plain text files
//! - Token-window chunking and topic assignment
//! - The ingestion ledger and document catalogue
//! - The ingestion coordinator, full-tree scan and upload

mod chunker;
mod error;
mod ingestor;
mod parsers;
mod repository;
mod topic;
mod watcher;

pub use chunker::{ChunkConfig, ChunkSplitter};
pub use error::{IngestError, IngestResult};
pub use ingestor::{Ingestor, ScanSummary};
pub use parsers::{DocumentParser, DocxParser, FileExtractor, PdfParser, TextParser};
pub use repository::DocumentRepository;
pub use topic::resolve_topic;
pub use watcher::{should_ignore_path, PathWatcher, WatchEvent, WatcherConfig, WatcherState};
