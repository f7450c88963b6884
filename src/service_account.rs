use std::path::Path;

use serde::Deserialize;

use crate::error::StoreError;

/// Service account information contained within the service account JSON file
/// that you can download from Firebase.
///
/// Only `project_id` and `client_email` are required. The signing fields are
/// optional at this stage; a key without them validates fine but cannot
/// authenticate requests.
///
/// `Serialize`, `Display`, and `Debug` are intentionally not implemented to
/// avoid accidentally leaking credentials.
#[derive(Deserialize, Clone)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: Option<String>,
    pub private_key_id: Option<String>,
    pub client_id: Option<String>,
}

const REQUIRED_FIELDS: [&str; 2] = ["project_id", "client_email"];

impl ServiceAccountKey {
    /// Reads and validates a service account JSON file. Shorthand for
    /// [`validate_key`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        validate_key(path)
    }
}

/// Reads the service account key at `path`, checks that it is well-formed JSON
/// carrying a non-empty `project_id` and `client_email`, and returns it.
///
/// Every failure is logged and then handed back to the caller unchanged.
pub fn validate_key(path: impl AsRef<Path>) -> Result<ServiceAccountKey, StoreError> {
    let path = path.as_ref();

    match read_key(path) {
        Ok(key) => {
            tracing::info!(
                project_id = %key.project_id,
                service_account_email = %key.client_email,
                "Service account key is valid"
            );
            Ok(key)
        }
        Err(err) => {
            tracing::error!(
                error = %err,
                error_code = ?err.code(),
                details = ?err,
                path = %path.display(),
                "Service account key validation failed"
            );
            Err(err)
        }
    }
}

fn read_key(path: &Path) -> Result<ServiceAccountKey, StoreError> {
    if !path.exists() {
        return Err(StoreError::KeyFileNotFound(path.to_path_buf()));
    }

    let contents = std::fs::read_to_string(path).map_err(|source| StoreError::KeyFileUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: serde_json::Value =
        serde_json::from_str(&contents).map_err(StoreError::KeyFileParse)?;

    for field in REQUIRED_FIELDS {
        let present = raw
            .get(field)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|value| !value.is_empty());

        if !present {
            return Err(StoreError::KeyFileSchema(field));
        }
    }

    serde_json::from_value(raw).map_err(StoreError::KeyFileParse)
}
