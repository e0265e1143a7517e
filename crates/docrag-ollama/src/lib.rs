//! DocRAG Ollama - Ollama integration for embeddings, answer generation and RAG.
//!
//! [`OllamaClient`] is the async HTTP client. [`OllamaService`] wraps it for
//! the synchronous pipeline as an `Embedder` and `AnswerGenerator`, and
//! [`RetrievalAssembler`] turns a question into a grounded answer.

mod client;
mod error;
pub mod rag;
mod service;
mod types;

pub use client::OllamaClient;
pub use error::{OllamaError, OllamaResult};
pub use rag::{RagConfig, RetrievalAssembler};
pub use service::OllamaService;
pub use types::*;
