use std::env;

use crate::ServiceAccountKey;

use super::client::{FirestoreClient, FirestoreClientOptions};

pub fn initialise() -> Result<FirestoreClient, anyhow::Error> {
    let key = ServiceAccountKey {
        project_id: env::var("FIREBASE_PROJECT_ID")?,
        client_email: env::var("FIREBASE_CLIENT_EMAIL")?,
        client_id: env::var("FIREBASE_CLIENT_ID").ok(),
        private_key_id: env::var("FIREBASE_PRIVATE_KEY_ID").ok(),
        private_key: Some(env::var("FIREBASE_PRIVATE_KEY")?.replace(r"\n", "\n")),
    };

    let client = FirestoreClient::initialise(key, FirestoreClientOptions::default())?;

    Ok(client)
}
