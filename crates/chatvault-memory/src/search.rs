//! Semantic search over messages.

use crate::backend::connect;
use crate::embeddings::{load_embedding_provider, EmbeddingOptions, EmbeddingProvider};
use crate::error::MemoryError;
use crate::store::{VectorMatch, VectorStore};
use crate::Result;
use chatvault_core::config::SearchConfig;
use chatvault_core::{MessageId, OwnerId};
use chatvault_history::ConversationStore;
use std::sync::Arc;
use tracing::{debug, error, warn};

struct Engine {
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

enum State {
    Ready(Engine),
    Disabled,
    /// The remote collection holds vectors of another dimension.
    Mismatched {
        model: String,
        expected: usize,
        actual: usize,
    },
}

/// Indexes and queries messages for an owner.
///
/// Without an embedding model every operation succeeds and does nothing;
/// search then returns no results. Against a collection of the wrong
/// dimension every operation fails with `DimensionMismatch`.
pub struct SemanticSearchService {
    state: State,
}

impl SemanticSearchService {
    /// Compose a provider and a store of the same dimension.
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Result<Self> {
        MemoryError::check_dimension(store.dimension(), embeddings.dimension())?;
        Ok(Self {
            state: State::Ready(Engine { embeddings, store }),
        })
    }

    /// Service with semantic search disabled.
    pub fn unavailable() -> Self {
        Self {
            state: State::Disabled,
        }
    }

    /// Service that refuses to index or search because the collection
    /// dimension differs from the model's.
    pub fn mismatched(model: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            state: State::Mismatched {
                model: model.into(),
                expected,
                actual,
            },
        }
    }

    /// Load the configured model and connect the configured backend.
    ///
    /// An unavailable model disables search instead of failing. A collection
    /// of the wrong dimension yields a service that refuses every operation.
    pub async fn from_config(
        config: &SearchConfig,
        options: &EmbeddingOptions,
        history: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        let embeddings = match load_embedding_provider(&config.embedding_model, options) {
            Ok(provider) => provider,
            Err(e) => {
                warn!("{}, semantic search disabled", e);
                return Ok(Self::unavailable());
            }
        };

        match connect(config, history, embeddings.dimension()).await {
            Ok(store) => Self::new(embeddings, store),
            Err(MemoryError::DimensionMismatch { expected, actual }) => {
                error!(
                    backend = config.backend.as_str(),
                    collection = %config.collection,
                    expected,
                    actual,
                    "Vector collection dimension does not match the embedding model, semantic search refused"
                );
                Ok(Self::mismatched(embeddings.model_name(), expected, actual))
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Name of the active vector backend.
    pub fn backend_name(&self) -> Option<&'static str> {
        match &self.state {
            State::Ready(engine) => Some(engine.store.name()),
            _ => None,
        }
    }

    /// Name of the loaded embedding model.
    pub fn model_name(&self) -> Option<&str> {
        match &self.state {
            State::Ready(engine) => Some(engine.embeddings.model_name()),
            State::Mismatched { model, .. } => Some(model.as_str()),
            State::Disabled => None,
        }
    }

    /// The error every operation returns, when search is refused.
    pub fn failure(&self) -> Option<MemoryError> {
        match self.state {
            State::Mismatched {
                expected, actual, ..
            } => Some(MemoryError::DimensionMismatch { expected, actual }),
            _ => None,
        }
    }

    fn engine(&self) -> Result<Option<&Engine>> {
        match &self.state {
            State::Ready(engine) => Ok(Some(engine)),
            State::Disabled => Ok(None),
            State::Mismatched {
                expected, actual, ..
            } => Err(MemoryError::DimensionMismatch {
                expected: *expected,
                actual: *actual,
            }),
        }
    }

    /// Embed and store a message. Returns the vector id, or `None` when
    /// search is disabled.
    pub async fn index_message(
        &self,
        id: MessageId,
        content: &str,
        owner: &OwnerId,
    ) -> Result<Option<String>> {
        let Some(engine) = self.engine()? else {
            return Ok(None);
        };

        let vector = engine.embeddings.embed_one(content).await?;
        engine.store.upsert(id, &vector, owner).await?;
        debug!("Indexed message {} into {}", id, engine.store.name());
        Ok(Some(engine.store.vector_id(id)))
    }

    /// Nearest messages of `owner` to `query`, by descending score.
    pub async fn search(
        &self,
        owner: &OwnerId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<VectorMatch>> {
        let Some(engine) = self.engine()? else {
            return Ok(Vec::new());
        };
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector = engine.embeddings.embed_one(query).await?;
        engine.store.query(&vector, limit, owner).await
    }

    /// Drop the vectors of deleted messages.
    pub async fn remove(&self, ids: &[MessageId]) -> Result<()> {
        match self.engine()? {
            Some(engine) if !ids.is_empty() => engine.store.delete(ids).await,
            _ => Ok(()),
        }
    }
}
