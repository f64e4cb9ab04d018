//! Pinecone REST backend.

use crate::error::MemoryError;
use crate::store::{rank, VectorMatch, VectorStore};
use crate::Result;
use async_trait::async_trait;
use chatvault_core::config::PineconeConfig;
use chatvault_core::{MessageId, OwnerId, SecretString};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Default controller API base.
pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";

const API_VERSION: &str = "2024-07";

const BACKEND: &str = "pinecone";

/// Metadata key holding the owner.
const OWNER_KEY: &str = "user_id";

/// Pinecone index addressed through its data-plane host.
pub struct PineconeStore {
    client: Client,
    api_key: SecretString,
    host: String,
    index: String,
    dimension: usize,
}

impl PineconeStore {
    /// Connect to `index`, resolving its host through the controller when
    /// `index_host` is unset, and check the index dimension.
    pub async fn connect(config: &PineconeConfig, index: &str, dimension: usize) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| MemoryError::init_failed(BACKEND, "API key is not configured"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MemoryError::init_failed(BACKEND, e.to_string()))?;

        let (host, index_dimension) = Self::describe(&client, &api_key, config, index)
            .await
            .map_err(|e| MemoryError::init_failed(BACKEND, e.to_string()))?;

        if let Some(actual) = index_dimension.filter(|d| *d > 0) {
            MemoryError::check_dimension(dimension, actual)?;
        }

        info!("Using Pinecone index {} at {}", index, host);
        Ok(Self {
            client,
            api_key,
            host,
            index: index.to_string(),
            dimension,
        })
    }

    async fn describe(
        client: &Client,
        api_key: &SecretString,
        config: &PineconeConfig,
        index: &str,
    ) -> Result<(String, Option<usize>)> {
        if let Some(host) = &config.index_host {
            let host = normalize_host(host);
            let response = authorized(client, api_key, Method::POST, format!("{}/describe_index_stats", host))
                .json(&json!({}))
                .send()
                .await?;
            let stats: IndexStats = check(response).await?.json().await?;
            return Ok((host, stats.dimension));
        }

        let controller = config
            .controller_url
            .as_deref()
            .unwrap_or(DEFAULT_CONTROLLER_URL)
            .trim_end_matches('/');
        let response = authorized(client, api_key, Method::GET, format!("{}/indexes/{}", controller, index))
            .send()
            .await?;
        let description: IndexDescription = check(response).await?.json().await?;
        Ok((normalize_host(&description.host), description.dimension))
    }

    fn request(&self, path: &str) -> RequestBuilder {
        authorized(&self.client, &self.api_key, Method::POST, format!("{}{}", self.host, path))
    }

    /// Index name.
    pub fn index(&self) -> &str {
        &self.index
    }
}

fn authorized(client: &Client, api_key: &SecretString, method: Method, url: String) -> RequestBuilder {
    client
        .request(method, url)
        .header("Api-Key", api_key.expose_secret())
        .header("X-Pinecone-API-Version", API_VERSION)
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(MemoryError::Backend(format!(
        "Pinecone returned HTTP {}: {}",
        status.as_u16(),
        text
    )))
}

#[async_trait]
impl VectorStore for PineconeStore {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, id: MessageId, vector: &[f32], owner: &OwnerId) -> Result<()> {
        MemoryError::check_dimension(self.dimension, vector.len())?;

        let mut metadata = Map::new();
        metadata.insert(OWNER_KEY.to_string(), Value::from(owner.as_str()));
        let body = UpsertRequest {
            vectors: vec![PineconeVector {
                id: self.vector_id(id),
                values: vector,
                metadata,
            }],
        };

        debug!("Upserting {} into Pinecone", id);
        check(self.request("/vectors/upsert").json(&body).send().await?).await?;
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
            "topK": limit,
            "filter": { "user_id": { "$eq": owner.as_str() } },
            "includeValues": true,
            "includeMetadata": true,
        });
        let response: QueryResponse = check(self.request("/query").json(&body).send().await?)
            .await?
            .json()
            .await?;

        let candidates = response.matches.into_iter().filter_map(|m| {
            let owned = m
                .metadata
                .as_ref()
                .and_then(|meta| meta.get(OWNER_KEY))
                .and_then(Value::as_str)
                .map_or(true, |o| o == owner.as_str());
            let id = m.id.parse::<MessageId>().ok();
            if id.is_none() {
                debug!("Skipping foreign Pinecone vector id {}", m.id);
            }
            id.filter(|_| owned).map(|id| (id, m.values))
        });

        Ok(rank(vector, candidates, limit))
    }

    async fn delete(&self, ids: &[MessageId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = ids.iter().map(|id| self.vector_id(*id)).collect();
        check(
            self.request("/vectors/delete")
                .json(&json!({ "ids": ids }))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

// Pinecone API types

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: String,
    values: &'a [f32],
    metadata: Map<String, Value>,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
    dimension: Option<usize>,
}

#[derive(Deserialize)]
struct IndexStats {
    dimension: Option<usize>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    values: Vec<f32>,
    metadata: Option<Map<String, Value>>,
}
