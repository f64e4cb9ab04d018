//! Configuration schema definitions.

use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use crate::types::OwnerId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main ChatVault configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Owner of the stored history.
    #[serde(default)]
    pub user: UserConfig,

    /// History persistence.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding model and vector backend.
    #[serde(default)]
    pub search: SearchConfig,

    /// Chat vendor endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// User section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    /// Owner id every record is scoped to.
    #[serde(default = "default_user_id")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
            email: None,
            name: None,
        }
    }
}

impl UserConfig {
    pub fn owner(&self) -> OwnerId {
        OwnerId::new(self.id.clone())
    }
}

/// Storage section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// History file. Defaults to `~/.chatvault/history.json`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the history file path.
    pub fn history_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.path {
            Some(path) => Ok(paths::expand_tilde(&path.to_string_lossy())),
            None => paths::history_file(),
        }
    }
}

/// Vector backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    /// Managed Pinecone index.
    Pinecone,
    /// Qdrant server.
    Qdrant,
    /// Brute-force scan over embeddings kept with the messages.
    #[default]
    InProcess,
}

impl VectorBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorBackend::Pinecone => "pinecone",
            VectorBackend::Qdrant => "qdrant",
            VectorBackend::InProcess => "in_process",
        }
    }

    /// Parse the `VECTOR_SEARCH_PROVIDER` value.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "pinecone" => Some(VectorBackend::Pinecone),
            "qdrant" => Some(VectorBackend::Qdrant),
            "in_process" | "inprocess" | "memory" | "local" => Some(VectorBackend::InProcess),
            _ => None,
        }
    }
}

/// Semantic search section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Embedding model name (`hash-384`, a sentence-transformers id, or `openai/<model>`).
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default)]
    pub backend: VectorBackend,

    /// Index (Pinecone) or collection (Qdrant) name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Result count when the caller gives none.
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    #[serde(default)]
    pub pinecone: PineconeConfig,

    #[serde(default)]
    pub qdrant: QdrantConfig,
}

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "hash-384";

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_collection() -> String {
    "ai-chat-history".to_string()
}

fn default_search_limit() -> usize {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            backend: VectorBackend::default(),
            collection: default_collection(),
            default_limit: default_search_limit(),
            pinecone: PineconeConfig::default(),
            qdrant: QdrantConfig::default(),
        }
    }
}

/// Pinecone credentials and endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PineconeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Legacy environment name (e.g. `us-east-1-aws`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// Data-plane host of the index. Resolved through the controller when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_host: Option<String>,

    /// Controller API base. Defaults to `https://api.pinecone.io`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_url: Option<String>,
}

/// Qdrant endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
        }
    }
}

/// Chat vendor endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: ProviderEndpoint,

    #[serde(default)]
    pub anthropic: ProviderEndpoint,

    #[serde(default)]
    pub google: ProviderEndpoint,
}

/// Per-vendor endpoint override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
