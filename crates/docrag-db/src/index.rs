//! [`VectorIndex`] implementation over the SQLite database.

use crate::database::Database;
use crate::error::DbError;
use docrag_core::{Chunk, Embedder, ScoredChunk, VectorIndex};
use std::sync::Arc;
use tracing::{debug, info};

/// Vector index that embeds through an [`Embedder`] and stores in SQLite.
#[derive(Clone)]
pub struct SqliteVectorIndex {
    db: Database,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorIndex {
    pub fn new(db: Database, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, embedder }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn add(&self, chunks: Vec<Chunk>) -> docrag_core::Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut entries = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let vector = self
                .embedder
                .embed(&chunk.content)
                .map_err(|e| DbError::Embedding(e.to_string()))?;
            entries.push((chunk, vector));
        }

        let stored = self
            .db
            .replace_source_chunks(&entries, self.embedder.model_name())?;
        info!("Indexed {} chunks", stored);
        Ok(())
    }

    fn search(
        &self,
        query: &str,
        top_k: usize,
        topic: Option<&str>,
    ) -> docrag_core::Result<Vec<ScoredChunk>> {
        let query_vector = self
            .embedder
            .embed(query)
            .map_err(|e| DbError::Embedding(e.to_string()))?;

        let results = self.db.vector_search(&query_vector, top_k, topic)?;
        debug!(
            "Similarity search returned {} chunks (top_k={}, topic={:?})",
            results.len(),
            top_k,
            topic
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_core::ChunkMetadata;

    /// Bag-of-words embedder: one dimension per vocabulary word.
    struct VocabEmbedder {
        vocab: Vec<&'static str>,
    }

    impl Embedder for VocabEmbedder {
        fn embed(&self, text: &str) -> docrag_core::Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(self
                .vocab
                .iter()
                .map(|w| lower.matches(w).count() as f32)
                .collect())
        }

        fn model_name(&self) -> &str {
            "vocab"
        }
    }

    struct BrokenEmbedder;

    impl Embedder for BrokenEmbedder {
        fn embed(&self, _text: &str) -> docrag_core::Result<Vec<f32>> {
            Err(docrag_core::Error::Embedding("model not loaded".to_string()))
        }

        fn model_name(&self) -> &str {
            "broken"
        }
    }

    fn index() -> SqliteVectorIndex {
        let embedder = VocabEmbedder {
            vocab: vec!["iva", "tax", "paella", "rice"],
        };
        SqliteVectorIndex::new(Database::open_in_memory().unwrap(), Arc::new(embedder))
    }

    fn meta(topic: &str, file: &str) -> ChunkMetadata {
        ChunkMetadata::new(topic, file, format!("/docs/{}/{}", topic, file))
    }

    #[test]
    fn test_add_then_search() {
        let index = index();
        index
            .add(vec![
                Chunk::new(0, "IVA is a tax on consumption", meta("tax-law", "iva.txt")),
                Chunk::new(0, "Paella is made with rice", meta("recipes", "paella.txt")),
            ])
            .unwrap();

        let results = index.search("what is the iva tax", 5, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.metadata.source_file, "iva.txt");

        let results = index.search("what is the iva tax", 5, Some("recipes")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.metadata.topic, "recipes");
    }

    #[test]
    fn test_add_empty_is_noop() {
        let index = index();
        index.add(Vec::new()).unwrap();
        assert_eq!(index.database().chunk_count().unwrap(), 0);
    }

    #[test]
    fn test_embedding_failure_writes_nothing() {
        let index =
            SqliteVectorIndex::new(Database::open_in_memory().unwrap(), Arc::new(BrokenEmbedder));

        let result = index.add(vec![Chunk::new(0, "text", meta("general", "a.txt"))]);
        assert!(result.is_err());
        assert_eq!(index.database().chunk_count().unwrap(), 0);
    }
}
