//! # Firestore
//!
//! A small gRPC client for Cloud Firestore, covering the operations this crate
//! needs: overwriting a document (optionally stamping a field with the
//! server's commit time) and reading one back.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use prediction_store::{
//!     firestore::{client::{FirestoreClient, FirestoreClientOptions}, collection},
//!     ServiceAccountKey,
//! };
//!
//! let key = ServiceAccountKey::from_file("./service-account-key.json")?;
//! let client = FirestoreClient::initialise(key, FirestoreClientOptions::default())?;
//!
//! let doc_ref = collection("predictions").doc("abc123");
//! let data = serde_json::json!({ "temp": 5 });
//!
//! client
//!     .set_document_with_server_timestamp(&doc_ref, data.as_object().unwrap(), "createdAt")
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod reference;
mod token_provider;
mod value;

/// Builds a client from `FIREBASE_*` environment variables for tests that
/// talk to a real Firestore project.
#[doc(hidden)]
pub mod test_helpers;

pub use reference::collection;
