//! Embedding generation providers.

use crate::error::MemoryError;
use crate::Result;
use async_trait::async_trait;
use chatvault_core::SecretString;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name the provider was loaded under.
    fn model_name(&self) -> &str;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Generate embeddings for texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::Embedding("No embedding returned".to_string()))
    }
}

/// Where and how named models are loaded.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingOptions {
    /// Cache directory for downloaded model files.
    pub models_dir: Option<PathBuf>,
    /// Key for `openai/<model>` names.
    pub openai_api_key: Option<SecretString>,
    /// OpenAI API base override.
    pub openai_base_url: Option<String>,
}

/// Names accepted for the local MiniLM model.
const MINILM_NAMES: &[&str] = &["sentence-transformers/all-minilm-l6-v2", "all-minilm-l6-v2"];

/// Load the provider for a configured model name.
///
/// Fails with [`MemoryError::ModelUnavailable`] for unknown names, for
/// `openai/<model>` without a key, and when a local model cannot be loaded.
pub fn load_embedding_provider(
    name: &str,
    options: &EmbeddingOptions,
) -> Result<Arc<dyn EmbeddingProvider>> {
    let normalized = name.trim().to_lowercase();

    let provider: Arc<dyn EmbeddingProvider> = if normalized == HashEmbeddings::NAME
        || normalized == "hash"
    {
        Arc::new(HashEmbeddings::default())
    } else if let Some(model) = name.trim().strip_prefix("openai/") {
        let key = options
            .openai_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                MemoryError::ModelUnavailable(format!("{} requires an OpenAI API key", name))
            })?;
        let mut provider = OpenAIEmbeddings::new(key).with_model(model);
        if let Some(url) = &options.openai_base_url {
            provider = provider.with_base_url(url.as_str());
        }
        Arc::new(provider)
    } else if MINILM_NAMES.contains(&normalized.as_str()) {
        load_minilm(options)?
    } else {
        return Err(MemoryError::ModelUnavailable(format!(
            "Unknown embedding model '{}'",
            name
        )));
    };

    info!(
        "Loaded embedding model {} (dimension {})",
        provider.model_name(),
        provider.dimension()
    );
    Ok(provider)
}

#[cfg(feature = "fastembed")]
fn load_minilm(options: &EmbeddingOptions) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(Arc::new(FastEmbedEmbeddings::new(options.models_dir.clone())?))
}

#[cfg(not(feature = "fastembed"))]
fn load_minilm(_options: &EmbeddingOptions) -> Result<Arc<dyn EmbeddingProvider>> {
    Err(MemoryError::ModelUnavailable(
        "all-MiniLM-L6-v2 requires building with the `fastembed` feature".to_string(),
    ))
}

/// Deterministic feature-hashing embeddings.
///
/// Each lowercase alphanumeric token is hashed with SHA-256; the first eight
/// bytes pick a bucket and the ninth a sign. The sum is L2-normalised, so
/// texts sharing vocabulary score high. Works offline and never changes
/// between releases.
#[derive(Debug, Clone)]
pub struct HashEmbeddings {
    dimension: usize,
}

impl Default for HashEmbeddings {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashEmbeddings {
    /// Configured name of the default model.
    pub const NAME: &'static str = "hash-384";

    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let bucket = digest[..8]
                .iter()
                .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[(bucket % self.dimension as u64) as usize] += sign;
        }

        normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddings {
    fn model_name(&self) -> &str {
        Self::NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// OpenAI embeddings provider.
pub struct OpenAIEmbeddings {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl OpenAIEmbeddings {
    /// Create a new OpenAI embeddings provider.
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-large" => 3072,
            _ => 1536,
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            input: &'a [String],
        }

        #[derive(Deserialize)]
        struct Response {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&Request {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MemoryError::Embedding(format!(
                "OpenAI returned HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let response: Response = response.json().await?;
        Ok(response.data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Local all-MiniLM-L6-v2 through ONNX runtime.
#[cfg(feature = "fastembed")]
pub struct FastEmbedEmbeddings {
    // fastembed's embed() takes &mut self.
    model: std::sync::Mutex<fastembed::TextEmbedding>,
}

#[cfg(feature = "fastembed")]
impl FastEmbedEmbeddings {
    pub const NAME: &'static str = "sentence-transformers/all-MiniLM-L6-v2";

    /// Load the model, downloading it into `cache_dir` on first use.
    pub fn new(cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            std::fs::create_dir_all(&dir)
                .map_err(|e| MemoryError::ModelUnavailable(e.to_string()))?;
            options = options.with_cache_dir(dir);
        }

        let model = fastembed::TextEmbedding::try_new(options)
            .map_err(|e| MemoryError::ModelUnavailable(e.to_string()))?;
        Ok(Self {
            model: std::sync::Mutex::new(model),
        })
    }
}

#[cfg(feature = "fastembed")]
#[async_trait]
impl EmbeddingProvider for FastEmbedEmbeddings {
    fn model_name(&self) -> &str {
        Self::NAME
    }

    fn dimension(&self) -> usize {
        384
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut model = self
            .model
            .lock()
            .map_err(|e| MemoryError::Embedding(format!("Model lock poisoned: {}", e)))?;
        model
            .embed(texts.to_vec(), None)
            .map_err(|e| MemoryError::Embedding(e.to_string()))
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
