use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::StoreError;
use crate::firestore::client::{FirestoreClient, FirestoreClientOptions};
use crate::service_account::validate_key;

/// Where the service account key is looked for unless configured otherwise.
pub const DEFAULT_KEY_FILE: &str = "./service-account-key.json";

/// What to do when the connection can't be set up at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartupPolicy {
    /// Log the failure and keep running without a connection. Every write
    /// then fails with [`StoreError::ConnectionUnavailable`].
    #[default]
    Degrade,
    /// Return the failure to the caller.
    FailFast,
}

#[derive(Clone, Debug)]
pub struct ConnectionOptions {
    pub key_path: PathBuf,
    pub firestore: FirestoreClientOptions,
    pub startup_policy: StartupPolicy,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            key_path: PathBuf::from(DEFAULT_KEY_FILE),
            firestore: FirestoreClientOptions::default(),
            startup_policy: StartupPolicy::default(),
        }
    }
}

impl ConnectionOptions {
    /// Defaults overlaid with `PREDICTION_STORE_KEY_FILE`, `FIRESTORE_HOST`,
    /// `FIRESTORE_TLS` and `PREDICTION_STORE_FAIL_FAST`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(path) = lookup("PREDICTION_STORE_KEY_FILE") {
            options = options.key_path(path);
        }
        if let Some(host) = lookup("FIRESTORE_HOST") {
            options.firestore = options.firestore.host(host);
        }
        if let Some(tls) = lookup("FIRESTORE_TLS") {
            options.firestore = options.firestore.tls(!is_false(&tls));
        }
        if lookup("PREDICTION_STORE_FAIL_FAST").is_some_and(|v| !is_false(&v)) {
            options.startup_policy = StartupPolicy::FailFast;
        }

        options
    }

    pub fn key_path(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.key_path = key_path.into();
        self
    }

    pub fn firestore(mut self, firestore: FirestoreClientOptions) -> Self {
        self.firestore = firestore;
        self
    }

    pub fn startup_policy(mut self, startup_policy: StartupPolicy) -> Self {
        self.startup_policy = startup_policy;
        self
    }
}

fn is_false(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no" | "off")
}

/// A live, fully initialised connection to Firestore.
#[derive(Clone)]
pub struct Connection {
    client: FirestoreClient,
    key_path: PathBuf,
}

impl Connection {
    pub fn client(&self) -> &FirestoreClient {
        &self.client
    }

    pub fn project_id(&self) -> &str {
        self.client.project_id()
    }

    /// The absolute path of the key file the connection was created from.
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

/// Validates the configured service account key and builds a Firestore
/// connection from it.
pub fn initialize_connection(options: &ConnectionOptions) -> Result<Connection, StoreError> {
    initialize(options).inspect_err(|err| {
        tracing::error!(
            error = %err,
            error_code = ?err.code(),
            details = ?err,
            "Failed to initialise Firestore connection"
        );
        tracing::error!(
            "Firestore initialisation failed. Likely causes:\n\
             - the service account key file is missing\n\
             - the project configuration is wrong\n\
             - the key file cannot be read due to missing permissions"
        );
    })
}

fn initialize(options: &ConnectionOptions) -> Result<Connection, StoreError> {
    let key_path = resolve_key_path(&options.key_path)?;
    let key = validate_key(&key_path)?;

    let client = FirestoreClient::initialise(key, options.firestore.clone())?;

    tracing::info!(
        project_id = %client.project_id(),
        host = %options.firestore.host,
        tls = options.firestore.tls,
        "Firestore connection initialised"
    );

    Ok(Connection { client, key_path })
}

fn resolve_key_path(path: &Path) -> Result<PathBuf, StoreError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    Ok(cwd.join(path))
}
