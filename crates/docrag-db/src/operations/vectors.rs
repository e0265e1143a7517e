//! Vector search operations for semantic search.

use super::chunks::{chunk_from_row, decode_vector, CHUNK_COLUMNS};
use crate::database::Database;
use crate::error::DbResult;
use docrag_core::ScoredChunk;
use rusqlite::params;

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

impl Database {
    /// Find the `limit` chunks most similar to `query_vector`.
    ///
    /// Brute-force scan over every stored embedding, optionally restricted to a
    /// topic. Results are ordered by descending similarity.
    pub fn vector_search(
        &self,
        query_vector: &[f32],
        limit: usize,
        topic: Option<&str>,
    ) -> DbResult<Vec<ScoredChunk>> {
        let conn = self.conn()?;

        let sql = format!(
            r#"
            SELECT {}, e.vector, e.dimensions
            FROM embeddings e
            JOIN chunks c ON c.id = e.chunk_id
            WHERE ?1 IS NULL OR c.topic = ?1
            "#,
            CHUNK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(params![topic], |row| {
            let chunk = chunk_from_row(row)?;
            let vector_bytes: Vec<u8> = row.get(6)?;
            let dimensions: i64 = row.get(7)?;
            Ok((chunk, vector_bytes, dimensions))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (chunk, vector_bytes, dimensions) = row?;
            let vector = decode_vector(&vector_bytes, dimensions as usize);
            results.push(ScoredChunk {
                score: cosine_similarity(query_vector, &vector),
                chunk,
            });
        }

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(limit);

        Ok(results)
    }
}
