//! SQLite repository for legal text records
//!
//! Records are keyed by (code, section, sub_section); inserting an existing
//! key updates text and vector in place. Vectors are stored as little-endian
//! f32 blobs of the configured dimensionality, and nearest-neighbor search
//! scans the rows of one code, which stays cheap at statute-corpus sizes.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{LegalText, LegalTextFilter, LegalTextRecord};

/// SQLite-backed repository for legal texts
pub struct LegalTextRepository {
    conn: Arc<Mutex<Connection>>,
    dimensions: usize,
}

impl LegalTextRepository {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P, dimensions: usize) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("failed to open database: {}", e)))?;

        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        };

        repo.migrate()?;
        Ok(repo)
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory(dimensions: usize) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("failed to open in-memory database: {}", e)))?;

        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
            dimensions,
        };

        repo.migrate()?;
        Ok(repo)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
        "#,
        )
        .map_err(|e| Error::database(format!("failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS legal_texts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code TEXT NOT NULL,
                section TEXT NOT NULL,
                sub_section TEXT NOT NULL DEFAULT '',
                text TEXT NOT NULL,
                text_vector BLOB NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE(code, section, sub_section)
            );

            CREATE INDEX IF NOT EXISTS idx_legal_texts_code ON legal_texts(code);
            CREATE INDEX IF NOT EXISTS idx_legal_texts_code_section
                ON legal_texts(code, section);
        "#,
        )
        .map_err(|e| Error::database(format!("failed to run migrations: {}", e)))?;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// Insert a legal text with its embedding, or update text and vector
    /// in place when the (code, section, sub_section) key already exists.
    /// Returns the stored record with its identifier populated.
    pub fn add(&self, text: &LegalText, vector: &[f32]) -> Result<LegalTextRecord> {
        self.check_dimensions(vector)?;

        let conn = self.conn.lock();
        Self::upsert(&conn, text, vector)?;
        Self::get_by_key(&conn, &text.code, &text.section, &text.sub_section)?
            .ok_or_else(|| Error::database("upserted record not found"))
    }

    /// Upsert a batch of legal texts with their embeddings inside one
    /// transaction. Returns the number of records written.
    pub fn add_batch(&self, entries: &[(LegalText, Vec<f32>)]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        for (_, vector) in entries {
            self.check_dimensions(vector)?;
        }

        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::database(format!("failed to begin transaction: {}", e)))?;

        for (text, vector) in entries {
            Self::upsert(&tx, text, vector)?;
        }

        tx.commit()
            .map_err(|e| Error::database(format!("failed to commit transaction: {}", e)))?;

        Ok(entries.len())
    }

    /// Retrieve records matching the filter, in insertion order.
    ///
    /// The sub_section-without-section precondition is enforced at the
    /// HTTP boundary, not here.
    pub fn get(&self, filter: &LegalTextFilter) -> Result<Vec<LegalTextRecord>> {
        let conn = self.conn.lock();

        let mut sql = String::from(
            "SELECT id, code, section, sub_section, text, text_vector, updated_at \
             FROM legal_texts WHERE code = ?1",
        );
        let mut params_vec: Vec<&str> = vec![filter.code.as_str()];

        if let Some(section) = filter.section.as_deref() {
            sql.push_str(" AND section = ?2");
            params_vec.push(section);
            if let Some(sub_section) = filter.sub_section.as_deref() {
                sql.push_str(" AND sub_section = ?3");
                params_vec.push(sub_section);
            }
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::database(format!("failed to prepare query: {}", e)))?;

        let records = stmt
            .query_map(rusqlite::params_from_iter(params_vec), row_to_record)
            .map_err(|e| Error::database(format!("failed to query legal texts: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| Error::database(format!("failed to read legal text row: {}", e)))?;

        Ok(records)
    }

    /// Count records with the given code
    pub fn count_by_code(&self, code: &str) -> Result<usize> {
        let conn = self.conn.lock();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM legal_texts WHERE code = ?1",
                params![code],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(format!("failed to count legal texts: {}", e)))?;

        Ok(count as usize)
    }

    /// List the distinct codes present in the store
    pub fn list_codes(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare("SELECT DISTINCT code FROM legal_texts")
            .map_err(|e| Error::database(format!("failed to prepare query: {}", e)))?;

        let codes = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::database(format!("failed to list codes: {}", e)))?
            .collect::<rusqlite::Result<Vec<String>>>()
            .map_err(|e| Error::database(format!("failed to read code row: {}", e)))?;

        Ok(codes)
    }

    /// Nearest-neighbor search over one code's records.
    ///
    /// Returns (record, distance) pairs ordered by ascending squared
    /// Euclidean distance, excluding distances above `cutoff` when given,
    /// truncated to `limit`. The sort is stable, so equal distances keep
    /// insertion order.
    pub fn semantic_search(
        &self,
        query_vector: &[f32],
        code: &str,
        limit: usize,
        cutoff: Option<f32>,
    ) -> Result<Vec<(LegalTextRecord, f32)>> {
        self.check_dimensions(query_vector)?;

        let filter = LegalTextFilter::by_code(code);
        let mut scored: Vec<(LegalTextRecord, f32)> = self
            .get(&filter)?
            .into_iter()
            .map(|record| {
                let distance = squared_l2_distance(query_vector, &record.text_vector);
                (record, distance)
            })
            .collect();

        if let Some(cutoff) = cutoff {
            scored.retain(|(_, distance)| *distance <= cutoff);
        }

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        scored.truncate(limit);

        Ok(scored)
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "expected {} dimensions, got {}",
                self.dimensions,
                vector.len()
            )));
        }
        Ok(())
    }

    fn upsert(conn: &Connection, text: &LegalText, vector: &[f32]) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO legal_texts (code, section, sub_section, text, text_vector, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(code, section, sub_section) DO UPDATE SET
                text = excluded.text,
                text_vector = excluded.text_vector,
                updated_at = excluded.updated_at
            "#,
            params![
                text.code,
                text.section,
                text.sub_section,
                text.text,
                vector_to_blob(vector),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(format!("failed to upsert legal text: {}", e)))?;

        Ok(())
    }

    fn get_by_key(
        conn: &Connection,
        code: &str,
        section: &str,
        sub_section: &str,
    ) -> Result<Option<LegalTextRecord>> {
        use rusqlite::OptionalExtension;

        let mut stmt = conn
            .prepare(
                "SELECT id, code, section, sub_section, text, text_vector, updated_at \
                 FROM legal_texts WHERE code = ?1 AND section = ?2 AND sub_section = ?3",
            )
            .map_err(|e| Error::database(format!("failed to prepare query: {}", e)))?;

        stmt.query_row(params![code, section, sub_section], row_to_record)
            .optional()
            .map_err(|e| Error::database(format!("failed to get legal text: {}", e)))
    }
}

// Helper functions

fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<LegalTextRecord> {
    let id: i64 = row.get(0)?;
    let code: String = row.get(1)?;
    let section: String = row.get(2)?;
    let sub_section: String = row.get(3)?;
    let text: String = row.get(4)?;
    let blob: Vec<u8> = row.get(5)?;
    let updated_at_str: String = row.get(6)?;

    Ok(LegalTextRecord {
        id,
        text,
        code,
        section,
        sub_section,
        text_vector: blob_to_vector(&blob),
        updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

fn blob_to_vector(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn squared_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
