//! Runs against a real Firestore project configured through `FIREBASE_*`
//! environment variables. Run with `cargo test -- --ignored`.

use std::sync::Arc;

use prediction_store::firestore::collection;
use prediction_store::PredictionStore;
use serde_json::json;

#[tokio::test]
#[ignore = "needs a Firestore project"]
async fn stores_and_overwrites_prediction() -> Result<(), Box<dyn std::error::Error>> {
    let client = prediction_store::firestore::test_helpers::initialise()?;
    let store = PredictionStore::with_store(Arc::new(client.clone()));

    let id = format!("live-{}", ulid::Ulid::new());
    let doc_ref = collection("predictions").doc(id.as_str());

    let first = store.store_data(&json!(id), &json!({ "temp": 5 })).await;
    assert!(first.is_success(), "{first:?}");

    let doc = client.get_document(&doc_ref).await?.unwrap();
    assert_eq!(doc.fields["temp"], 5);
    assert!(doc.fields["createdAt"]["seconds"].is_i64());

    let second = store.store_data(&json!(id), &json!({ "humidity": 80 })).await;
    assert!(second.is_success(), "{second:?}");

    let doc = client.get_document(&doc_ref).await?.unwrap();
    assert!(!doc.fields.contains_key("temp"));
    assert_eq!(doc.fields["humidity"], 80);

    Ok(())
}

#[tokio::test]
#[ignore = "needs a Firestore project"]
async fn plain_set_document_has_no_created_at() -> Result<(), Box<dyn std::error::Error>> {
    let client = prediction_store::firestore::test_helpers::initialise()?;

    let id = format!("live-{}", ulid::Ulid::new());
    let doc_ref = collection("predictions").doc(id.as_str());
    let fields = json!({ "temp": 5 });

    client.set_document(&doc_ref, fields.as_object().unwrap()).await?;

    let doc = client.get_document(&doc_ref).await?.unwrap();
    assert_eq!(doc.fields["temp"], 5);
    assert!(!doc.fields.contains_key("createdAt"));

    Ok(())
}
