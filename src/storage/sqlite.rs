//! SQLite document store implementation
//!
//! Collections map to a `collection` column on a single `documents` table;
//! the rowid doubles as the generated document identifier.

use crate::storage::traits::{DocumentStore, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;

/// SQLite-backed document store
pub struct SqliteDocStore {
    conn: Connection,
}

impl SqliteDocStore {
    /// Opens (or creates) a document store at the given path
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory store (useful for tests and dry runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_collection
            ON documents (collection);
    ",
    )
}

impl DocumentStore for SqliteDocStore {
    fn insert_batch(&mut self, collection: &str, docs: &[Value]) -> StorageResult<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(docs.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (collection, body, created_at) VALUES (?1, ?2, ?3)",
            )?;
            for doc in docs {
                let body = serde_json::to_string(doc)?;
                stmt.execute(params![collection, body, now])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn find_by_ids(&self, collection: &str, ids: &[i64]) -> StorageResult<Vec<Value>> {
        let mut stmt = self
            .conn
            .prepare("SELECT body FROM documents WHERE id = ?1 AND collection = ?2")?;

        let mut docs = Vec::with_capacity(ids.len());
        for id in ids {
            let body: Option<String> = stmt
                .query_row(params![id, collection], |row| row.get(0))
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            if let Some(body) = body {
                docs.push(serde_json::from_str(&body)?);
            }
        }
        Ok(docs)
    }

    fn list_collections(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}
