use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupted cache entry: {0}")]
    Corrupted(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Snapshot of what the cache holds
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub models: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

/// Embedding vectors keyed by `(model, text)`.
///
/// Vectors are stored as little-endian f32 blobs. The model name is part of
/// the key because vectors from different models are not comparable.
pub struct EmbeddingCache {
    conn: Connection,
    max_entries: usize,
}

impl EmbeddingCache {
    pub fn open(db_path: &Path, max_entries: usize) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        Ok(Self { conn, max_entries })
    }

    pub fn open_in_memory(max_entries: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self { conn, max_entries })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS embeddings (
                model TEXT NOT NULL,
                text TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                vector BLOB NOT NULL,
                cached_at INTEGER NOT NULL,
                PRIMARY KEY (model, text)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS embeddings_cached_at ON embeddings (cached_at)",
            [],
        )?;

        Ok(())
    }

    pub fn get(&self, model: &str, text: &str) -> Result<Option<Vec<f32>>> {
        let row: Option<(i64, Vec<u8>)> = self
            .conn
            .query_row(
                "SELECT dimension, vector FROM embeddings WHERE model = ?1 AND text = ?2",
                params![model, text],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((dimension, blob)) => decode_vector(&blob, dimension).map(Some),
            None => Ok(None),
        }
    }

    pub fn put(&self, model: &str, text: &str, vector: &[f32]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO embeddings (model, text, dimension, vector, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                model,
                text,
                vector.len() as i64,
                encode_vector(vector),
                Utc::now().timestamp_millis()
            ],
        )?;

        self.evict_overflow()?;
        Ok(())
    }

    /// Drop the oldest entries beyond `max_entries`
    fn evict_overflow(&self) -> Result<()> {
        let count = self.len()?;
        if count <= self.max_entries {
            return Ok(());
        }

        let overflow = (count - self.max_entries) as i64;
        let removed = self.conn.execute(
            "DELETE FROM embeddings WHERE rowid IN (
                SELECT rowid FROM embeddings ORDER BY cached_at ASC, rowid ASC LIMIT ?1
            )",
            params![overflow],
        )?;

        debug!("Evicted {} cached embeddings", removed);
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn clear(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM embeddings", [])?)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let (entries, models, oldest, newest): (i64, i64, Option<i64>, Option<i64>) =
            self.conn.query_row(
                "SELECT COUNT(*), COUNT(DISTINCT model), MIN(cached_at), MAX(cached_at)
                 FROM embeddings",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(CacheStats {
            entries: entries as usize,
            models: models as usize,
            oldest: oldest.and_then(DateTime::<Utc>::from_timestamp_millis),
            newest: newest.and_then(DateTime::<Utc>::from_timestamp_millis),
        })
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vector(blob: &[u8], dimension: i64) -> Result<Vec<f32>> {
    if blob.len() != dimension as usize * 4 {
        return Err(CacheError::Corrupted(format!(
            "expected {} floats, found {} bytes",
            dimension,
            blob.len()
        )));
    }

    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}
