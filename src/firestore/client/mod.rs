use anyhow::Context;
use firestore_grpc::tonic;
use firestore_grpc::tonic::{
    codegen::InterceptedService, metadata::AsciiMetadataValue, transport::Channel, Request, Status,
};
use firestore_grpc::v1::document_transform::field_transform::{ServerValue, TransformType};
use firestore_grpc::v1::document_transform::FieldTransform;
use firestore_grpc::v1::firestore_client::FirestoreClient as GrpcFirestoreClient;
use firestore_grpc::v1::write::Operation;
use firestore_grpc::v1::{CommitRequest, Document, GetDocumentRequest, Write};
use serde_json::Map;

use crate::error::StoreError;
use crate::ServiceAccountKey;

use super::reference::DocumentReference;
use super::token_provider::FirestoreTokenProvider;
use super::value::{from_firestore_fields, to_firestore_fields};

mod options;

pub use options::FirestoreClientOptions;

type InterceptorFunction = Box<dyn FnMut(Request<()>) -> Result<Request<()>, Status> + Send>;

type GrpcClient = GrpcFirestoreClient<InterceptedService<Channel, InterceptorFunction>>;

/// A handle to one Firestore database. Cloning is cheap, and all clones share
/// the same gRPC channel and access token cache. Every method takes `&self`,
/// so a single client can serve any number of concurrent requests.
#[derive(Clone)]
pub struct FirestoreClient {
    channel: Channel,
    token_provider: FirestoreTokenProvider,
    project_id: String,
    database_path: String,
    root_resource_path: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreDocument {
    /// The document data as a JSON object.
    pub fields: Map<String, serde_json::Value>,
    /// The time at which the document was created, in seconds of UTC time since Unix epoch.
    pub create_time: Option<i64>,
    /// The time at which the document was last updated, in seconds of UTC time since Unix epoch.
    pub update_time: Option<i64>,
}

fn create_auth_interceptor(token_provider: FirestoreTokenProvider) -> InterceptorFunction {
    Box::new(move |mut req: Request<()>| {
        let token = token_provider
            .get_token()
            .map_err(|_| Status::unauthenticated("Could not get token from token provider"))?;

        let bearer_token = format!("Bearer {token}");
        let mut header_value: AsciiMetadataValue = bearer_token.parse().map_err(|_| {
            Status::unauthenticated("Failed to construct metadata value for authorization token")
        })?;
        header_value.set_sensitive(true);

        req.metadata_mut().insert("authorization", header_value);

        Ok(req)
    })
}

impl FirestoreClient {
    /// Create a client for the project named in the service account key.
    ///
    /// The underlying channel connects lazily, so no network traffic happens
    /// until the first request. Must be called from within a Tokio runtime.
    pub fn initialise(
        key: ServiceAccountKey,
        options: FirestoreClientOptions,
    ) -> Result<Self, StoreError> {
        let channel = Channel::from_shared(options.endpoint_url())
            .context("Failed to create gRPC channel")?
            .connect_lazy();

        let project_id = key.project_id.clone();
        let database_path = format!("projects/{project_id}/databases/(default)");
        let root_resource_path = format!("{database_path}/documents");

        Ok(Self {
            channel,
            token_provider: FirestoreTokenProvider::new(key),
            project_id,
            database_path,
            root_resource_path,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Retrieve a document from Firestore at the given document reference.
    /// Returns `None` if the document doesn't exist.
    pub async fn get_document(
        &self,
        doc_ref: &DocumentReference,
    ) -> Result<Option<FirestoreDocument>, StoreError> {
        let request = GetDocumentRequest {
            name: self.get_name_with(doc_ref),
            mask: None,
            consistency_selector: None,
        };

        match self.grpc().get_document(request).await {
            Ok(res) => {
                let doc = res.into_inner();
                Ok(Some(FirestoreDocument {
                    fields: from_firestore_fields(doc.fields),
                    create_time: doc.create_time.map(|t| t.seconds),
                    update_time: doc.update_time.map(|t| t.seconds),
                }))
            }
            Err(err) if err.code() == tonic::Code::NotFound => Ok(None),
            Err(source) => Err(StoreError::StoreRead {
                document: doc_ref.to_string(),
                source,
            }),
        }
    }

    /// Sets a document at the given document reference. If it doesn't already
    /// exist, it is created, and if it does exist already, it is overwritten.
    pub async fn set_document(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, serde_json::Value>,
    ) -> Result<(), StoreError> {
        let write = self.set_write(doc_ref, fields, Vec::new());
        self.commit(doc_ref, write).await
    }

    /// Like [`set_document`](Self::set_document), but additionally sets
    /// `timestamp_field` to the time at which Firestore commits the write.
    ///
    /// Any value for `timestamp_field` already present in `fields` is dropped
    /// in favour of the server time.
    #[tracing::instrument(name = "Set Firestore document", skip_all, fields(document = %doc_ref))]
    pub async fn set_document_with_server_timestamp(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, serde_json::Value>,
        timestamp_field: &str,
    ) -> Result<(), StoreError> {
        let write = self.server_timestamp_write(doc_ref, fields, timestamp_field);
        self.commit(doc_ref, write).await
    }

    fn server_timestamp_write(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, serde_json::Value>,
        timestamp_field: &str,
    ) -> Write {
        let transforms = vec![FieldTransform {
            field_path: timestamp_field.to_string(),
            transform_type: Some(TransformType::SetToServerValue(
                ServerValue::RequestTime as i32,
            )),
        }];

        let mut fields = fields.clone();
        fields.remove(timestamp_field);

        self.set_write(doc_ref, &fields, transforms)
    }

    fn set_write(
        &self,
        doc_ref: &DocumentReference,
        fields: &Map<String, serde_json::Value>,
        update_transforms: Vec<FieldTransform>,
    ) -> Write {
        let document = Document {
            name: self.get_name_with(doc_ref),
            fields: to_firestore_fields(fields),
            create_time: None,
            update_time: None,
        };

        // Without an update mask the whole document is replaced.
        Write {
            update_mask: None,
            update_transforms,
            current_document: None,
            operation: Some(Operation::Update(document)),
        }
    }

    async fn commit(&self, doc_ref: &DocumentReference, write: Write) -> Result<(), StoreError> {
        let request = CommitRequest {
            database: self.database_path.clone(),
            writes: vec![write],
            transaction: Vec::new(),
        };

        self.grpc()
            .commit(request)
            .await
            .map_err(|source| StoreError::StoreWrite {
                document: doc_ref.to_string(),
                source,
            })?;

        Ok(())
    }

    // Cloning a channel is supposedly very cheap and encouraged by tonic's
    // documentation.
    fn grpc(&self) -> GrpcClient {
        GrpcFirestoreClient::with_interceptor(
            self.channel.clone(),
            create_auth_interceptor(self.token_provider.clone()),
        )
    }

    pub(crate) fn get_name_with(&self, item: impl std::fmt::Display) -> String {
        format!("{}/{}", self.root_resource_path, item)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::firestore::collection;

    fn test_key() -> ServiceAccountKey {
        ServiceAccountKey {
            project_id: "weather-predictions".to_string(),
            client_email: "writer@weather-predictions.iam.gserviceaccount.com".to_string(),
            private_key: None,
            private_key_id: None,
            client_id: None,
        }
    }

    #[test]
    fn implements_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<super::FirestoreClient>();
    }

    #[tokio::test]
    async fn resource_names_are_rooted_in_the_project() {
        let client =
            FirestoreClient::initialise(test_key(), FirestoreClientOptions::default()).unwrap();

        assert_eq!(client.project_id(), "weather-predictions");
        assert_eq!(
            client.get_name_with(collection("predictions").doc("abc123")),
            "projects/weather-predictions/databases/(default)/documents/predictions/abc123"
        );
    }

    #[tokio::test]
    async fn invalid_host_fails_to_initialise() {
        let options = FirestoreClientOptions::default().host("not a host");

        let result = FirestoreClient::initialise(test_key(), options);

        assert!(matches!(result, Err(StoreError::Other(_))));
    }

    fn offline_client() -> FirestoreClient {
        let options = FirestoreClientOptions::default()
            .host("127.0.0.1:1")
            .tls(false);
        FirestoreClient::initialise(test_key(), options).unwrap()
    }

    fn updated_document(write: &Write) -> &Document {
        match &write.operation {
            Some(Operation::Update(document)) => document,
            other => panic!("expected an update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_timestamp_write_replaces_document_and_stamps_request_time() {
        let client = offline_client();
        let doc_ref = collection("predictions").doc("abc123");
        let fields = json!({ "temp": 5, "createdAt": "yesterday" });

        let write =
            client.server_timestamp_write(&doc_ref, fields.as_object().unwrap(), "createdAt");

        assert!(write.update_mask.is_none());
        assert!(write.current_document.is_none());
        assert_eq!(
            write.update_transforms,
            vec![FieldTransform {
                field_path: "createdAt".to_string(),
                transform_type: Some(TransformType::SetToServerValue(
                    ServerValue::RequestTime as i32
                )),
            }]
        );

        let document = updated_document(&write);
        assert_eq!(
            document.name,
            "projects/weather-predictions/databases/(default)/documents/predictions/abc123"
        );
        assert!(document.fields.contains_key("temp"));
        assert!(!document.fields.contains_key("createdAt"));
    }

    #[tokio::test]
    async fn plain_set_write_has_no_transforms() {
        let client = offline_client();
        let doc_ref = collection("predictions").doc("abc123");
        let fields = json!({ "temp": 5, "createdAt": "yesterday" });

        let write = client.set_write(&doc_ref, fields.as_object().unwrap(), Vec::new());

        assert!(write.update_mask.is_none());
        assert!(write.update_transforms.is_empty());
        let document = updated_document(&write);
        assert!(document.fields.contains_key("temp"));
        assert!(document.fields.contains_key("createdAt"));
    }

    // The test key has no private key, so the auth interceptor rejects every
    // call before anything is sent.
    #[tokio::test]
    async fn unauthenticated_set_document_reports_grpc_code() {
        let client = offline_client();
        let doc_ref = collection("predictions").doc("abc123");

        let result = client.set_document(&doc_ref, &Map::new()).await;

        let err = result.unwrap_err();
        assert!(matches!(
            &err,
            StoreError::StoreWrite { document, .. } if document == "predictions/abc123"
        ));
        assert_eq!(err.code(), Some(tonic::Code::Unauthenticated as i32));
    }

    #[tokio::test]
    async fn unauthenticated_get_document_reports_grpc_code() {
        let client = offline_client();
        let doc_ref = collection("predictions").doc("abc123");

        let result = client.get_document(&doc_ref).await;

        let err = result.unwrap_err();
        assert!(matches!(
            &err,
            StoreError::StoreRead { document, .. } if document == "predictions/abc123"
        ));
        assert_eq!(err.code(), Some(tonic::Code::Unauthenticated as i32));
    }
}
