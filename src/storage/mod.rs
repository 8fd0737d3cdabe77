//! Storage module: document store trait, SQLite backend, and the record sink

mod sink;
mod sqlite;
mod traits;

pub use sink::RecordSink;
pub use sqlite::SqliteDocStore;
pub use traits::{DocumentStore, StorageError, StorageResult};
