//! Qdrant REST backend.

use crate::error::MemoryError;
use crate::store::{rank, VectorMatch, VectorStore};
use crate::Result;
use async_trait::async_trait;
use chatvault_core::config::QdrantConfig;
use chatvault_core::{MessageId, OwnerId, SecretString};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

const BACKEND: &str = "qdrant";

/// Payload key holding the owner.
const OWNER_KEY: &str = "user_id";

/// Qdrant collection with cosine distance.
///
/// Points are keyed by the numeric message id.
pub struct QdrantStore {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect, creating the collection when it does not exist.
    pub async fn connect(config: &QdrantConfig, collection: &str, dimension: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MemoryError::init_failed(BACKEND, e.to_string()))?;

        let store = Self {
            client,
            url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            collection: collection.to_string(),
            dimension,
        };

        let existing = store
            .collection_size()
            .await
            .map_err(|e| MemoryError::init_failed(BACKEND, e.to_string()))?;

        match existing {
            Some(Some(size)) => MemoryError::check_dimension(dimension, size)?,
            Some(None) => {
                return Err(MemoryError::init_failed(
                    BACKEND,
                    format!("collection {} uses named vectors", store.collection),
                ))
            }
            None => store
                .create_collection()
                .await
                .map_err(|e| MemoryError::init_failed(BACKEND, e.to_string()))?,
        }

        info!("Using Qdrant collection {} at {}", store.collection, store.url);
        Ok(store)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(
            method,
            format!("{}/collections/{}{}", self.url, self.collection, path),
        );
        match &self.api_key {
            Some(key) => builder.header("api-key", key.expose_secret()),
            None => builder,
        }
    }

    /// `None` when the collection is missing; `Some(None)` when it uses
    /// named vectors whose size cannot be read.
    async fn collection_size(&self) -> Result<Option<Option<usize>>> {
        let response = self.request(Method::GET, "").send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let info: QdrantResult<Value> = check(response).await?.json().await?;
        let size = info
            .result
            .pointer("/config/params/vectors/size")
            .and_then(Value::as_u64)
            .map(|s| s as usize);
        Ok(Some(size))
    }

    async fn create_collection(&self) -> Result<()> {
        info!(
            "Creating Qdrant collection {} (size {})",
            self.collection, self.dimension
        );
        let body = json!({ "vectors": { "size": self.dimension, "distance": "Cosine" } });
        check(self.request(Method::PUT, "").json(&body).send().await?).await?;
        Ok(())
    }

    /// Collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(MemoryError::Backend(format!(
        "Qdrant returned HTTP {}: {}",
        status.as_u16(),
        text
    )))
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vector_id(&self, id: MessageId) -> String {
        id.get().to_string()
    }

    async fn upsert(&self, id: MessageId, vector: &[f32], owner: &OwnerId) -> Result<()> {
        MemoryError::check_dimension(self.dimension, vector.len())?;

        let body = UpsertRequest {
            points: vec![QdrantPoint {
                id: id.get(),
                vector,
                payload: json!({ "user_id": owner.as_str() }),
            }],
        };

        debug!("Upserting {} into Qdrant", id);
        check(
            self.request(Method::PUT, "/points?wait=true")
                .json(&body)
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        owner: &OwnerId,
    ) -> Result<Vec<VectorMatch>> {
        MemoryError::check_dimension(self.dimension, vector.len())?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let body = json!({
            "vector": vector,
            "limit": limit,
            "filter": { "must": [{ "key": OWNER_KEY, "match": { "value": owner.as_str() } }] },
            "with_vector": true,
            "with_payload": true,
        });
        let response: QdrantResult<Vec<ScoredPoint>> = check(
            self.request(Method::POST, "/points/search")
                .json(&body)
                .send()
                .await?,
        )
        .await?
        .json()
        .await?;

        let candidates = response.result.into_iter().filter_map(|point| {
            let owned = point
                .payload
                .get(OWNER_KEY)
                .and_then(Value::as_str)
                .map_or(true, |o| o == owner.as_str());
            let id = point.id.as_u64().map(MessageId::new);
            match (id, point.vector) {
                (Some(id), Some(vector)) if owned => Some((id, vector)),
                _ => None,
            }
        });

        Ok(rank(vector, candidates, limit))
    }

    async fn delete(&self, ids: &[MessageId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let points: Vec<u64> = ids.iter().map(|id| id.get()).collect();
        check(
            self.request(Method::POST, "/points/delete?wait=true")
                .json(&json!({ "points": points }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

// Qdrant API types

#[derive(Serialize)]
struct UpsertRequest<'a> {
    points: Vec<QdrantPoint<'a>>,
}

#[derive(Serialize)]
struct QdrantPoint<'a> {
    id: u64,
    vector: &'a [f32],
    payload: Value,
}

#[derive(Deserialize)]
struct QdrantResult<T> {
    result: T,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    #[serde(default)]
    payload: Value,
    vector: Option<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer) -> QdrantConfig {
        QdrantConfig {
            url: server.uri(),
            api_key: Some(SecretString::new("qd-test")),
        }
    }

    async fn mount_collection(server: &MockServer, size: usize) {
        Mock::given(method("GET"))
            .and(path("/collections/ai-chat-history"))
            .and(header("api-key", "qd-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "status": "green",
                    "config": { "params": { "vectors": { "size": size, "distance": "Cosine" } } }
                },
                "status": "ok",
                "time": 0.001
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_connect_creates_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/ai-chat-history"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": { "error": "Not found: Collection `ai-chat-history` doesn't exist!" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/collections/ai-chat-history"))
            .and(body_partial_json(json!({ "vectors": { "size": 384, "distance": "Cosine" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": true, "status": "ok" })))
            .expect(1)
            .mount(&server)
            .await;

        let store = QdrantStore::connect(&config(&server), "ai-chat-history", 384)
            .await
            .unwrap();
        assert_eq!(store.collection(), "ai-chat-history");
    }

    #[tokio::test]
    async fn test_connect_dimension_mismatch() {
        let server = MockServer::start().await;
        mount_collection(&server, 768).await;

        let result = QdrantStore::connect(&config(&server), "ai-chat-history", 384).await;
        assert!(matches!(
            result,
            Err(MemoryError::DimensionMismatch { expected: 384, actual: 768 })
        ));
    }

    #[tokio::test]
    async fn test_connect_rejects_named_vectors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/collections/ai-chat-history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "config": { "params": { "vectors": { "text": { "size": 384, "distance": "Cosine" } } } }
                },
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let result = QdrantStore::connect(&config(&server), "ai-chat-history", 384).await;
        assert!(matches!(result, Err(MemoryError::BackendInitFailed { backend: "qdrant", .. })));
    }

    #[tokio::test]
    async fn test_connect_unreachable() {
        let cfg = QdrantConfig {
            url: "http://127.0.0.1:9".to_string(),
            api_key: None,
        };
        let result = QdrantStore::connect(&cfg, "ai-chat-history", 384).await;
        assert!(matches!(result, Err(MemoryError::BackendInitFailed { backend: "qdrant", .. })));
    }

    #[tokio::test]
    async fn test_upsert_and_search() {
        let server = MockServer::start().await;
        mount_collection(&server, 2).await;
        Mock::given(method("PUT"))
            .and(path("/collections/ai-chat-history/points"))
            .and(body_partial_json(json!({
                "points": [{ "id": 11, "vector": [0.6, 0.8], "payload": { "user_id": "alice" } }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": { "operation_id": 1, "status": "completed" }, "status": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/collections/ai-chat-history/points/search"))
            .and(body_partial_json(json!({
                "limit": 3,
                "filter": { "must": [{ "key": "user_id", "match": { "value": "alice" } }] },
                "with_vector": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [
                    { "id": 12, "version": 1, "score": 0.9, "payload": { "user_id": "alice" }, "vector": [0.0, 1.0] },
                    { "id": 11, "version": 1, "score": 0.8, "payload": { "user_id": "alice" }, "vector": [0.6, 0.8] },
                    { "id": 13, "version": 1, "score": 0.7, "payload": { "user_id": "eve" }, "vector": [0.6, 0.8] }
                ],
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let store = QdrantStore::connect(&config(&server), "ai-chat-history", 2)
            .await
            .unwrap();
        let alice = OwnerId::new("alice");
        store.upsert(MessageId::new(11), &[0.6, 0.8], &alice).await.unwrap();

        let hits = store.query(&[0.6, 0.8], 3, &alice).await.unwrap();
        let ids: Vec<u64> = hits.iter().map(|h| h.message_id.get()).collect();
        assert_eq!(ids, vec![11, 12]);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score > hits[1].score);
        assert_eq!(store.vector_id(MessageId::new(11)), "11");
    }
}
