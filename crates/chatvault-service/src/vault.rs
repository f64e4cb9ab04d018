//! The service facade.

use crate::error::{Result, ServiceError};
use chatvault_core::env::{self, vars};
use chatvault_core::{paths, Config, Conversation, ConversationId, Message, OwnerId, Platform, SecretString};
use chatvault_history::{ConversationStore, HistoryStore, ImportedConversation};
use chatvault_memory::{EmbeddingOptions, SemanticSearchService};
use chatvault_providers::ChatProviderAdapter;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a request needs, scoped to one owner.
pub struct ChatVault {
    pub(crate) owner: OwnerId,
    pub(crate) history: Arc<HistoryStore>,
    pub(crate) providers: ChatProviderAdapter,
    pub(crate) search: SemanticSearchService,
    pub(crate) default_limit: usize,
}

/// Semantic search status for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStatus {
    pub available: bool,
    pub model: Option<String>,
    pub backend: Option<&'static str>,
    /// Why search is refused, when it is.
    pub error: Option<String>,
}

impl ChatVault {
    /// Open the history file and connect providers and search from config.
    pub async fn open(config: &Config) -> Result<Self> {
        let owner = config.user.owner();
        let history = Arc::new(HistoryStore::open(config.storage.history_path()?)?);
        let providers = ChatProviderAdapter::new(&config.providers)?;

        let openai_api_key = match env::get_var(vars::OPENAI_API_KEY) {
            Some(key) => Some(SecretString::new(key)),
            None => history.active_api_key(&owner, Platform::OpenAI).await?,
        };
        let options = EmbeddingOptions {
            models_dir: paths::models_dir().ok(),
            openai_api_key,
            openai_base_url: None,
        };
        let search =
            SemanticSearchService::from_config(&config.search, &options, history.clone()).await?;

        info!(owner = %owner, "Opened history");
        Ok(Self::new(owner, history, providers, search).with_default_limit(config.search.default_limit))
    }

    /// Assemble from parts.
    pub fn new(
        owner: OwnerId,
        history: Arc<HistoryStore>,
        providers: ChatProviderAdapter,
        search: SemanticSearchService,
    ) -> Self {
        Self {
            owner,
            history,
            providers,
            search,
            default_limit: 10,
        }
    }

    /// Result count used when a search gives none.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// The history store, for CRUD the service does not wrap.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn providers(&self) -> &ChatProviderAdapter {
        &self.providers
    }

    pub fn search_status(&self) -> SearchStatus {
        SearchStatus {
            available: self.search.is_available(),
            model: self.search.model_name().map(str::to_string),
            backend: self.search.backend_name(),
            error: self.search.failure().map(|e| e.to_string()),
        }
    }

    /// Models offered for a platform, using the owner's key when one is set.
    pub async fn models(&self, platform: Platform) -> Result<Vec<String>> {
        let key = self.history.active_api_key(&self.owner, platform).await?;
        Ok(self.providers.models(platform, key.as_ref()).await?)
    }

    /// Delete a conversation and drop its vectors.
    pub async fn delete_conversation(&self, id: ConversationId) -> Result<()> {
        let removed = self.history.delete_conversation(&self.owner, id).await?;
        if let Err(e) = self.search.remove(&removed).await {
            warn!(conversation = %id, "Failed to drop vectors: {}", e);
        }
        Ok(())
    }

    /// Delete one message and drop its vector.
    pub async fn delete_message(&self, id: chatvault_core::MessageId) -> Result<()> {
        self.history.delete_message(&self.owner, id).await?;
        if let Err(e) = self.search.remove(&[id]).await {
            warn!(message = %id, "Failed to drop vector: {}", e);
        }
        Ok(())
    }

    /// Import a JSON transcript and index its messages.
    pub async fn import(&self, json: &str) -> Result<Conversation> {
        let imported = ImportedConversation::from_json(json)?;
        let (conversation, messages) = self.history.import_conversation(&self.owner, imported).await?;
        for message in &messages {
            self.index(message).await;
        }
        info!(conversation = %conversation.id, messages = messages.len(), "Imported conversation");
        Ok(conversation)
    }

    /// Re-embed every message of the owner. Returns the number indexed.
    pub async fn reindex(&self) -> Result<usize> {
        if let Some(e) = self.search.failure() {
            return Err(e.into());
        }
        if !self.search.is_available() {
            return Err(ServiceError::Invalid(
                "Semantic search is unavailable".to_string(),
            ));
        }

        let mut indexed = 0;
        for conversation in self.all_conversations().await? {
            let messages = self.history.history(&self.owner, conversation.id).await?;
            for message in &messages {
                if self.index(message).await {
                    indexed += 1;
                }
            }
        }
        info!(messages = indexed, "Reindexed history");
        Ok(indexed)
    }

    async fn all_conversations(&self) -> Result<Vec<Conversation>> {
        let mut page = chatvault_history::Page {
            page: 1,
            per_page: 100,
        };
        let mut all = Vec::new();
        loop {
            let listed = self
                .history
                .list_conversations(&self.owner, &Default::default(), page)
                .await?;
            all.extend(listed.items);
            if page.page >= listed.pages {
                return Ok(all);
            }
            page.page += 1;
        }
    }

    /// Index a message and record it. Failures are logged, never returned.
    pub(crate) async fn index(&self, message: &Message) -> bool {
        match self
            .search
            .index_message(message.id, &message.content, &self.owner)
            .await
        {
            Ok(Some(vector_id)) => {
                if let Err(e) = self
                    .history
                    .record_embedding(&self.owner, message.id, vector_id)
                    .await
                {
                    warn!(message = %message.id, "Failed to record embedding: {}", e);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(message = %message.id, "Indexing failed: {}", e);
                false
            }
        }
    }
}
