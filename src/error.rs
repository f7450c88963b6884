use std::path::PathBuf;

use firestore_grpc::tonic;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Service account key file not found: {}", .0.display())]
    KeyFileNotFound(PathBuf),

    #[error("Failed to read service account key file {}", .path.display())]
    KeyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Service account key file is not valid JSON")]
    KeyFileParse(#[source] serde_json::Error),

    #[error("Invalid service account key structure: missing `{0}`")]
    KeyFileSchema(&'static str),

    #[error("Firestore connection unavailable")]
    ConnectionUnavailable,

    #[error("invalid document id")]
    InvalidDocumentId,

    #[error("invalid data object")]
    InvalidDataObject,

    #[error("Failed to write document '{document}': {}", .source.message())]
    StoreWrite {
        document: String,
        #[source]
        source: tonic::Status,
    },

    #[error("Failed to read document '{document}': {}", .source.message())]
    StoreRead {
        document: String,
        #[source]
        source: tonic::Status,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    /// A numeric code for the failure, if the underlying cause carries one:
    /// the gRPC status code for store failures and the OS error number for
    /// unreadable key files.
    pub fn code(&self) -> Option<i32> {
        match self {
            StoreError::KeyFileUnreadable { source, .. } => source.raw_os_error(),
            StoreError::StoreWrite { source, .. } | StoreError::StoreRead { source, .. } => {
                Some(source.code() as i32)
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

// Taken from https://www.lpalmieri.com/posts/error-handling-rust/#internal-errors
fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
