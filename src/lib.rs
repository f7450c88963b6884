//! # Prediction store
//!
//! Writes prediction documents to Cloud Firestore.
//!
//! Startup validates a service account key file and opens a Firestore
//! connection (see [`connection`]). After that, [`PredictionStore::store_data`]
//! writes one document per call into the `predictions` collection, stamped
//! with a server-side `createdAt` time, and reports the outcome as a
//! [`WriteResult`] instead of an error.
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use prediction_store::{ConnectionOptions, PredictionStore};
//!
//! let store = PredictionStore::connect(&ConnectionOptions::from_env()).await?;
//!
//! let result = store
//!     .store_data(&"abc123".into(), &serde_json::json!({ "temp": 5 }))
//!     .await;
//!
//! println!("{}", serde_json::to_string(&result)?);
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod firestore;
pub mod predictions;
mod service_account;

pub use connection::{initialize_connection, Connection, ConnectionOptions, StartupPolicy};
pub use error::StoreError;
pub use predictions::{DocumentStore, PredictionRecord, PredictionStore, WriteResult};
pub use service_account::{validate_key, ServiceAccountKey};
