use prediction_store::{
    firestore::client::FirestoreClientOptions, ConnectionOptions, PredictionStore, StartupPolicy,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // This assumes that a local Firestore emulator is running on port 8081,
    // e.g. with a firebase.json similar to this:
    // {
    //   "emulators": {
    //     "firestore": {
    //       "port": 8081
    //     }
    //   }
    // }
    // Important note: you must use 127.0.0.1 instead of localhost.
    let options = ConnectionOptions::default()
        .key_path("./service-account-key.json")
        .firestore(
            FirestoreClientOptions::default()
                .host("127.0.0.1:8081")
                .tls(false),
        )
        .startup_policy(StartupPolicy::FailFast);

    let store = PredictionStore::connect(&options).await?;

    let result = store
        .store_data(
            &"first".into(),
            &serde_json::json!({ "label": "rain", "confidence": 0.93 }),
        )
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
