//! Record sink: the engine's single write path
//!
//! The sink converts typed records to their persistable documents, submits
//! them as one batch, and returns the generated identifiers. A backend
//! failure is logged and reported as an empty identifier list; the records
//! of that batch are simply not confirmed persisted, and the run carries on.

use crate::records::{DocId, TypedRecord};
use crate::storage::traits::{DocumentStore, StorageResult};
use std::sync::{Arc, Mutex};

/// Shared handle over a document store
///
/// The backend sits behind a mutex, so a store that is not itself safe for
/// concurrent use is serialized at the write boundary while fetches stay
/// parallel.
#[derive(Clone)]
pub struct RecordSink {
    store: Arc<Mutex<dyn DocumentStore + Send>>,
}

impl RecordSink {
    pub fn new(store: Arc<Mutex<dyn DocumentStore + Send>>) -> Self {
        Self { store }
    }

    /// Persists a batch of records into `collection`
    ///
    /// Empty input is a no-op returning an empty list without touching the
    /// backend. On a backend failure the batch yields no identifiers.
    pub fn append(&self, collection: &str, records: &[TypedRecord]) -> Vec<DocId> {
        if records.is_empty() {
            return Vec::new();
        }

        let docs: Vec<_> = records.iter().map(TypedRecord::to_document).collect();
        let result = {
            let mut store = self.store.lock().unwrap();
            store.insert_batch(collection, &docs)
        };

        match result {
            Ok(ids) => ids,
            Err(e) => {
                tracing::error!(
                    collection,
                    count = records.len(),
                    error = %e,
                    "batch insert failed; records unconfirmed"
                );
                Vec::new()
            }
        }
    }

    /// Reads back documents by identifier
    pub fn find_by_ids(&self, collection: &str, ids: &[DocId]) -> StorageResult<Vec<serde_json::Value>> {
        self.store.lock().unwrap().find_by_ids(collection, ids)
    }

    /// Lists the collections currently holding documents
    pub fn list_collections(&self) -> StorageResult<Vec<String>> {
        self.store.lock().unwrap().list_collections()
    }
}
