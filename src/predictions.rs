//! Storing predictions.
//!
//! [`PredictionStore`] is the one entry point most callers need. It owns the
//! (possibly absent) connection created at startup and turns every write into a
//! [`WriteResult`], so callers never have to deal with errors on this path.

use std::sync::Arc;

use async_trait::async_trait;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::connection::{initialize_connection, Connection, ConnectionOptions, StartupPolicy};
use crate::error::StoreError;
use crate::firestore::client::FirestoreClient;
use crate::firestore::reference::{collection, CollectionReference, DocumentReference};

pub const PREDICTIONS_COLLECTION: &str = "predictions";

/// Field set to the server's commit time on every write.
pub const CREATED_AT_FIELD: &str = "createdAt";

const SUCCESS_MESSAGE: &str = "write succeeded";

/// Somewhere documents can be written to. Implemented for Firestore by
/// [`FirestoreClient`] and [`Connection`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `doc_ref` with `fields`, plus `timestamp_field`
    /// set to the store's own time of the write.
    async fn set_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, Value>,
        timestamp_field: &str,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn set_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, Value>,
        timestamp_field: &str,
    ) -> Result<(), StoreError> {
        self.set_document_with_server_timestamp(doc_ref, fields, timestamp_field)
            .await
    }
}

#[async_trait]
impl DocumentStore for Connection {
    async fn set_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, Value>,
        timestamp_field: &str,
    ) -> Result<(), StoreError> {
        self.client()
            .set_with_server_timestamp(doc_ref, fields, timestamp_field)
            .await
    }
}

/// A prediction that passed input validation and is ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRecord {
    pub id: String,
    pub data: Map<String, Value>,
}

impl PredictionRecord {
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Result<Self, StoreError> {
        let id = id.into();
        if !is_valid_document_id(&id) {
            return Err(StoreError::InvalidDocumentId);
        }
        Ok(Self { id, data })
    }

    /// Checks the shape of untyped input: `id` has to be a string usable as a
    /// document ID and `data` has to be a JSON object.
    pub fn from_json(id: &Value, data: &Value) -> Result<Self, StoreError> {
        let Value::String(id) = id else {
            return Err(StoreError::InvalidDocumentId);
        };
        let Value::Object(data) = data else {
            return Err(StoreError::InvalidDataObject);
        };

        Self::new(id.as_str(), data.clone())
    }
}

/// Firestore document IDs are a single path segment and can't be `.` or `..`.
fn is_valid_document_id(id: &str) -> bool {
    !id.is_empty() && !id.contains('/') && id != "." && id != ".."
}

/// The outcome of a write. Serializes to
/// `{"success": true, "message", "id"}` or
/// `{"success": false, "error", "errorCode", "details"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    Success {
        message: String,
        id: String,
    },
    Failure {
        error: String,
        error_code: Option<i32>,
        details: String,
    },
}

impl WriteResult {
    pub fn is_success(&self) -> bool {
        matches!(self, WriteResult::Success { .. })
    }
}

impl From<&StoreError> for WriteResult {
    fn from(err: &StoreError) -> Self {
        WriteResult::Failure {
            error: err.to_string(),
            error_code: err.code(),
            details: format!("{err:?}").trim_end().to_string(),
        }
    }
}

impl Serialize for WriteResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            WriteResult::Success { message, id } => {
                let mut state = serializer.serialize_struct("WriteResult", 3)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("message", message)?;
                state.serialize_field("id", id)?;
                state.end()
            }
            WriteResult::Failure {
                error,
                error_code,
                details,
            } => {
                let mut state = serializer.serialize_struct("WriteResult", 4)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", error)?;
                state.serialize_field("errorCode", error_code)?;
                state.serialize_field("details", details)?;
                state.end()
            }
        }
    }
}

/// Writes predictions into the `predictions` collection.
///
/// A store is created once and then shared, e.g. behind an `Arc`; `store_data`
/// only needs `&self`, so concurrent writes don't wait on each other.
pub struct PredictionStore {
    store: Option<Arc<dyn DocumentStore>>,
    connection: Option<Connection>,
    collection: CollectionReference,
}

impl PredictionStore {
    /// Runs the startup sequence (key validation, then connection setup).
    ///
    /// Under [`StartupPolicy::Degrade`] a failure leaves the store without a
    /// connection and this never returns `Err`. Under
    /// [`StartupPolicy::FailFast`] the failure is returned.
    pub async fn connect(options: &ConnectionOptions) -> Result<Self, StoreError> {
        match initialize_connection(options) {
            Ok(connection) => Ok(Self::new(Some(connection))),
            Err(err) if options.startup_policy == StartupPolicy::Degrade => {
                tracing::error!(
                    error = %err,
                    "Could not create a Firestore connection, continuing without one"
                );
                Ok(Self::disconnected())
            }
            Err(err) => Err(err),
        }
    }

    pub fn new(connection: Option<Connection>) -> Self {
        match connection {
            Some(connection) => Self {
                store: Some(Arc::new(connection.clone())),
                connection: Some(connection),
                collection: collection(PREDICTIONS_COLLECTION),
            },
            None => Self::disconnected(),
        }
    }

    /// A store writing through any [`DocumentStore`]. It has no
    /// [`connection`](Self::connection) of its own.
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store: Some(store),
            connection: None,
            collection: collection(PREDICTIONS_COLLECTION),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            store: None,
            connection: None,
            collection: collection(PREDICTIONS_COLLECTION),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    /// The `predictions` collection, for callers that need lower-level access.
    /// `None` when there is no connection.
    pub fn collection(&self) -> Option<&CollectionReference> {
        self.store.as_ref().map(|_| &self.collection)
    }

    /// The Firestore connection created at startup, if there is one.
    pub fn connection(&self) -> Option<&Connection> {
        self.connection.as_ref()
    }

    /// The Firestore client behind the connection. Together with
    /// [`collection`](Self::collection) this allows reads and writes the
    /// store itself doesn't offer.
    pub fn client(&self) -> Option<&FirestoreClient> {
        self.connection.as_ref().map(Connection::client)
    }

    /// Validates `id` and `data`, then writes `data` plus a server-side
    /// `createdAt` timestamp to `predictions/{id}`, replacing any existing
    /// document.
    ///
    /// Never fails: every problem is reported as [`WriteResult::Failure`].
    pub async fn store_data(&self, id: &Value, data: &Value) -> WriteResult {
        let result = match &self.store {
            None => Err(StoreError::ConnectionUnavailable),
            Some(store) => match PredictionRecord::from_json(id, data) {
                Ok(record) => self.write(store.as_ref(), &record).await,
                Err(err) => Err(err),
            },
        };

        into_write_result(result)
    }

    /// Typed counterpart of [`store_data`](Self::store_data).
    pub async fn store(&self, id: &str, data: Map<String, Value>) -> WriteResult {
        let result = match &self.store {
            None => Err(StoreError::ConnectionUnavailable),
            Some(store) => match PredictionRecord::new(id, data) {
                Ok(record) => self.write(store.as_ref(), &record).await,
                Err(err) => Err(err),
            },
        };

        into_write_result(result)
    }

    async fn write(
        &self,
        store: &dyn DocumentStore,
        record: &PredictionRecord,
    ) -> Result<String, StoreError> {
        let doc_ref = self.collection.doc(record.id.as_str());

        tracing::info!(
            id = %record.id,
            fields = ?record.data.keys().collect::<Vec<_>>(),
            "Storing prediction"
        );

        store
            .set_with_server_timestamp(&doc_ref, &record.data, CREATED_AT_FIELD)
            .await?;

        tracing::info!(id = %record.id, "Prediction stored");

        Ok(record.id.clone())
    }
}

fn into_write_result(result: Result<String, StoreError>) -> WriteResult {
    match result {
        Ok(id) => WriteResult::Success {
            message: SUCCESS_MESSAGE.to_string(),
            id,
        },
        Err(err) => {
            tracing::error!(
                error = %err,
                error_code = ?err.code(),
                details = ?err,
                "Failed to store prediction"
            );
            WriteResult::from(&err)
        }
    }
}
