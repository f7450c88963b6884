use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use firestore_grpc::tonic;
use prediction_store::firestore::reference::DocumentReference;
use prediction_store::{DocumentStore, StoreError};
use serde_json::{Map, Value};

/// Keeps documents in memory, resolving the server timestamp to a counter that
/// increases with every write.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<String, Map<String, Value>>>,
    clock: AtomicI64,
    write_attempts: AtomicI64,
}

impl InMemoryStore {
    pub fn document(&self, path: &str) -> Option<Map<String, Value>> {
        self.documents.read().unwrap().get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap().len()
    }

    pub fn write_attempts(&self) -> i64 {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn set_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, Value>,
        timestamp_field: &str,
    ) -> Result<(), StoreError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let mut document = fields.clone();
        let now = self.clock.fetch_add(1, Ordering::SeqCst) + 1;
        document.insert(timestamp_field.to_string(), Value::from(now));

        self.documents
            .write()
            .unwrap()
            .insert(doc_ref.to_string(), document);

        Ok(())
    }
}

/// Rejects every write the way Firestore does when the service account lacks
/// permissions.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn set_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        _fields: &Map<String, Value>,
        _timestamp_field: &str,
    ) -> Result<(), StoreError> {
        self.attempts.lock().unwrap().push(doc_ref.to_string());

        Err(StoreError::StoreWrite {
            document: doc_ref.to_string(),
            source: tonic::Status::permission_denied("Missing or insufficient permissions."),
        })
    }
}
