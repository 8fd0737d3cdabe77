//! Storage trait and error types
//!
//! The engine only ever needs two operations from its backing store: batch
//! insert into a named collection, and lookup by generated identifier. The
//! trait keeps the backend swappable and lets tests run against fakes.

use crate::records::DocId;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for document store backends
///
/// Implementations persist schemaless JSON documents grouped into named
/// collections and hand back one generated identifier per inserted document,
/// in input order.
pub trait DocumentStore {
    /// Inserts a batch of documents into a collection as one atomic write
    ///
    /// Returns the generated identifiers in the same order as `docs`.
    fn insert_batch(&mut self, collection: &str, docs: &[Value]) -> StorageResult<Vec<DocId>>;

    /// Fetches documents by identifier from a collection
    ///
    /// Identifiers with no matching document are silently skipped.
    fn find_by_ids(&self, collection: &str, ids: &[DocId]) -> StorageResult<Vec<Value>>;

    /// Lists the names of all collections holding at least one document
    fn list_collections(&self) -> StorageResult<Vec<String>>;
}
