//! Platform dispatch over the three chat backends.

use crate::anthropic::AnthropicBackend;
use crate::google::GoogleBackend;
use crate::openai::OpenAIBackend;
use crate::{ChatBackend, ChatTurn, ProviderError, ProviderResponse, Result};
use chatvault_core::config::ProvidersConfig;
use chatvault_core::{Platform, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Normalizes OpenAI, Anthropic and Google behind one `send` call.
#[derive(Clone)]
pub struct ChatProviderAdapter {
    backends: HashMap<Platform, Arc<dyn ChatBackend>>,
}

impl ChatProviderAdapter {
    /// Register all three backends, applying configured base URLs.
    pub fn new(config: &ProvidersConfig) -> Result<Self> {
        let mut openai = OpenAIBackend::new()?;
        if let Some(url) = &config.openai.base_url {
            openai = openai.with_base_url(url.as_str());
        }
        let mut anthropic = AnthropicBackend::new()?;
        if let Some(url) = &config.anthropic.base_url {
            anthropic = anthropic.with_base_url(url.as_str());
        }
        let mut google = GoogleBackend::new()?;
        if let Some(url) = &config.google.base_url {
            google = google.with_base_url(url.as_str());
        }

        Ok(Self::empty()
            .with_backend(Arc::new(openai))
            .with_backend(Arc::new(anthropic))
            .with_backend(Arc::new(google)))
    }

    /// Adapter with no backends registered.
    pub fn empty() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Register or replace the backend for its platform.
    pub fn with_backend(mut self, backend: Arc<dyn ChatBackend>) -> Self {
        self.backends.insert(backend.platform(), backend);
        self
    }

    fn backend(&self, platform: Platform) -> Result<&Arc<dyn ChatBackend>> {
        self.backends
            .get(&platform)
            .ok_or_else(|| ProviderError::UnsupportedPlatform(platform.to_string()))
    }

    /// Send the turns to the platform's vendor. Failures are returned as-is.
    pub async fn send(
        &self,
        platform: Platform,
        model: &str,
        api_key: &SecretString,
        turns: &[ChatTurn],
    ) -> Result<ProviderResponse> {
        let backend = self.backend(platform)?;
        debug!(
            "Dispatching {} turns to {} model {}",
            turns.len(),
            platform,
            model
        );

        let result = backend.complete(model, api_key, turns).await;
        if let Err(e) = &result {
            warn!("{} call failed: {}", platform.display_name(), e);
        }
        result
    }

    /// Models offered for a platform.
    pub async fn models(
        &self,
        platform: Platform,
        api_key: Option<&SecretString>,
    ) -> Result<Vec<String>> {
        self.backend(platform)?.list_models(api_key).await
    }

    /// Registered platforms in stable order.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<_> = self.backends.keys().copied().collect();
        platforms.sort();
        platforms
    }
}
