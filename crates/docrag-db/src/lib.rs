//! DocRAG DB - SQLite storage for chunks and their embeddings.
//!
//! [`SqliteVectorIndex`] is the durable store of record for indexed chunks and
//! implements the [`docrag_core::VectorIndex`] collaborator.

mod database;
mod error;
mod index;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use index::SqliteVectorIndex;
pub use operations::vectors::cosine_similarity;
