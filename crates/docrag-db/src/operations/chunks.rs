//! Chunk storage operations.

use crate::database::Database;
use crate::error::DbResult;
use docrag_core::{Chunk, ChunkMetadata};
use rusqlite::{params, Row};
use std::collections::BTreeSet;
use tracing::debug;

pub(crate) const CHUNK_COLUMNS: &str =
    "c.id, c.ordinal, c.content, c.topic, c.source_file, c.source_path";

/// Map a row selected with [`CHUNK_COLUMNS`] (in that order) to a chunk.
pub(crate) fn chunk_from_row(row: &Row<'_>) -> rusqlite::Result<Chunk> {
    let ordinal: i64 = row.get(1)?;
    Ok(Chunk {
        id: row.get(0)?,
        ordinal: ordinal as usize,
        content: row.get(2)?,
        metadata: ChunkMetadata {
            topic: row.get(3)?,
            source_file: row.get(4)?,
            source_path: row.get(5)?,
        },
    })
}

pub(crate) fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub(crate) fn decode_vector(bytes: &[u8], dimensions: usize) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .take(dimensions)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

impl Database {
    /// Store chunks with their embeddings in one transaction.
    ///
    /// Rows previously stored for any source path present in `entries` are
    /// removed first, so re-indexing a file replaces its chunks.
    pub fn replace_source_chunks(
        &self,
        entries: &[(Chunk, Vec<f32>)],
        model: &str,
    ) -> DbResult<usize> {
        let sources: BTreeSet<&str> = entries
            .iter()
            .map(|(chunk, _)| chunk.metadata.source_path.as_str())
            .collect();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        {
            let mut delete = tx.prepare("DELETE FROM chunks WHERE source_path = ?1")?;
            for source in &sources {
                let removed = delete.execute(params![source])?;
                if removed > 0 {
                    debug!("Replacing {} stored chunks for {}", removed, source);
                }
            }

            let mut insert_chunk = tx.prepare(
                r#"
                INSERT INTO chunks (id, ordinal, content, topic, source_file, source_path)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;
            let mut insert_embedding = tx.prepare(
                r#"
                INSERT OR REPLACE INTO embeddings (chunk_id, vector, model, dimensions)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;

            for (chunk, vector) in entries {
                insert_chunk.execute(params![
                    chunk.id,
                    chunk.ordinal as i64,
                    chunk.content,
                    chunk.metadata.topic,
                    chunk.metadata.source_file,
                    chunk.metadata.source_path,
                ])?;
                insert_embedding.execute(params![
                    chunk.id,
                    encode_vector(vector),
                    model,
                    vector.len() as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(entries.len())
    }

    /// All chunks stored for a source path, in ordinal order.
    pub fn chunks_by_source(&self, source_path: &str) -> DbResult<Vec<Chunk>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM chunks c WHERE c.source_path = ?1 ORDER BY c.ordinal",
            CHUNK_COLUMNS
        ))?;

        let chunks = stmt.query_map(params![source_path], chunk_from_row)?;
        Ok(chunks.collect::<Result<Vec<_>, _>>()?)
    }

    /// Total number of stored chunks.
    pub fn chunk_count(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of stored embeddings.
    pub fn embedding_count(&self) -> DbResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count)
    }
}
