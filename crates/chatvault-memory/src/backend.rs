//! Vector backend selection.

use crate::error::MemoryError;
use crate::pinecone::PineconeStore;
use crate::qdrant::QdrantStore;
use crate::store::{InProcessVectorStore, VectorStore};
use crate::Result;
use chatvault_core::config::{SearchConfig, VectorBackend};
use chatvault_history::ConversationStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the configured vector store.
///
/// A remote backend that fails to initialize is replaced by the in-process
/// store with a warning. A dimension mismatch against an existing remote
/// index is returned as an error.
pub async fn connect(
    config: &SearchConfig,
    history: Arc<dyn ConversationStore>,
    dimension: usize,
) -> Result<Arc<dyn VectorStore>> {
    let remote: Result<Arc<dyn VectorStore>> = match config.backend {
        VectorBackend::InProcess => {
            info!("Using in-process vector search");
            return Ok(Arc::new(InProcessVectorStore::new(history, dimension)));
        }
        VectorBackend::Pinecone => {
            PineconeStore::connect(&config.pinecone, &config.collection, dimension)
                .await
                .map(|store| Arc::new(store) as Arc<dyn VectorStore>)
        }
        VectorBackend::Qdrant => QdrantStore::connect(&config.qdrant, &config.collection, dimension)
            .await
            .map(|store| Arc::new(store) as Arc<dyn VectorStore>),
    };

    match remote {
        Ok(store) => Ok(store),
        Err(e @ MemoryError::DimensionMismatch { .. }) => Err(e),
        Err(e) => {
            warn!("{}, falling back to in-process vector search", e);
            Ok(Arc::new(InProcessVectorStore::new(history, dimension)))
        }
    }
}
