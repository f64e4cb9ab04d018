//! Configuration loading and persistence.

use super::{Config, LogLevel, VectorBackend};
use crate::env::{self, vars};
use crate::error::ConfigError;
use crate::paths;
use crate::secret::SecretString;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to the default path.
    pub fn save_default(&self) -> Result<(), ConfigError> {
        let path = paths::config_file()?;
        self.save(&path)
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.user.id.trim().is_empty() {
            errors.push("User id must not be empty".to_string());
        }

        if self.search.embedding_model.trim().is_empty() {
            errors.push("Search embedding_model must not be empty".to_string());
        }

        if self.search.collection.trim().is_empty() {
            errors.push("Search collection must not be empty".to_string());
        }

        if self.search.default_limit == 0 || self.search.default_limit > 100 {
            errors.push(format!(
                "Search default_limit must be 1-100, got {}",
                self.search.default_limit
            ));
        }

        match self.search.backend {
            VectorBackend::Pinecone => {
                let has_key = self
                    .search
                    .pinecone
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty());
                if !has_key {
                    errors.push("Search backend is 'pinecone' but no pinecone.api_key is set".to_string());
                }
            }
            VectorBackend::Qdrant => {
                if self.search.qdrant.url.trim().is_empty() {
                    errors.push("Search backend is 'qdrant' but qdrant.url is empty".to_string());
                }
            }
            VectorBackend::InProcess => {}
        }

        for (name, endpoint) in [
            ("openai", &self.providers.openai),
            ("anthropic", &self.providers.anthropic),
            ("google", &self.providers.google),
        ] {
            if let Some(url) = &endpoint.base_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    errors.push(format!(
                        "Provider '{}': base_url must start with http:// or https://, got '{}'",
                        name, url
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load configuration from the default path, falling back to environment defaults
    /// if no file exists.
    pub fn load_or_default() -> Self {
        match Self::load_default() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => Self::from_env_defaults(),
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load from an explicit path when given, else the default location.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::load_or_default()),
        }
    }

    /// Create a Config from defaults, overridden by environment variables.
    pub fn from_env_defaults() -> Self {
        let mut config = Self::default();
        config.apply_env_with(env::get_var);
        config
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Reads `VECTOR_SEARCH_PROVIDER`, the Pinecone and Qdrant variables,
    /// `EMBEDDING_MODEL` and `CHATVAULT_USER`.
    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = get(vars::VECTOR_SEARCH_PROVIDER) {
            match VectorBackend::from_name(&backend) {
                Some(backend) => self.search.backend = backend,
                None => tracing::warn!(value = %backend, "Unknown vector search provider, ignoring"),
            }
        }

        if let Some(key) = get(vars::PINECONE_API_KEY) {
            self.search.pinecone.api_key = Some(SecretString::new(key));
        }
        if let Some(environment) = get(vars::PINECONE_ENVIRONMENT) {
            self.search.pinecone.environment = Some(environment);
        }
        if let Some(host) = get(vars::PINECONE_INDEX_HOST) {
            self.search.pinecone.index_host = Some(host);
        }
        if let Some(index) = get(vars::PINECONE_INDEX_NAME) {
            self.search.collection = index;
        }

        if let Some(url) = get(vars::QDRANT_URL) {
            self.search.qdrant.url = url;
        }
        if let Some(key) = get(vars::QDRANT_API_KEY) {
            self.search.qdrant.api_key = Some(SecretString::new(key));
        }

        if let Some(model) = get(vars::EMBEDDING_MODEL) {
            self.search.embedding_model = model;
        }

        if let Some(user) = get(vars::CHATVAULT_USER) {
            self.user.id = user;
        }
    }
}

/// Configuration builder for creating configs programmatically.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owner id.
    pub fn user(mut self, id: impl Into<String>) -> Self {
        self.config.user.id = id.into();
        self
    }

    /// Set the history file.
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.path = Some(path.into());
        self
    }

    /// Set the embedding model.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.search.embedding_model = model.into();
        self
    }

    /// Set the vector backend.
    pub fn backend(mut self, backend: VectorBackend) -> Self {
        self.config.search.backend = backend;
        self
    }

    /// Set the collection/index name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.search.collection = name.into();
        self
    }

    /// Configure Pinecone with a key and an explicit index host.
    pub fn pinecone(mut self, api_key: impl Into<String>, index_host: Option<String>) -> Self {
        self.config.search.pinecone.api_key = Some(SecretString::new(api_key));
        self.config.search.pinecone.index_host = index_host;
        self
    }

    /// Set the Pinecone controller URL.
    pub fn pinecone_controller(mut self, url: impl Into<String>) -> Self {
        self.config.search.pinecone.controller_url = Some(url.into());
        self
    }

    /// Configure Qdrant.
    pub fn qdrant(mut self, url: impl Into<String>, api_key: Option<String>) -> Self {
        self.config.search.qdrant.url = url.into();
        self.config.search.qdrant.api_key = api_key.map(SecretString::new);
        self
    }

    /// Override the OpenAI base URL.
    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.providers.openai.base_url = Some(url.into());
        self
    }

    /// Override the Anthropic base URL.
    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.providers.anthropic.base_url = Some(url.into());
        self
    }

    /// Override the Google base URL.
    pub fn google_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.providers.google.base_url = Some(url.into());
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Emit JSON log lines.
    pub fn json_logs(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate.
    pub fn build_validated(self) -> Result<Config, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
