//! Vector storage.

use crate::embeddings::cosine_similarity;
use crate::error::MemoryError;
use crate::Result;
use async_trait::async_trait;
use chatvault_core::{MessageId, OwnerId};
use chatvault_history::ConversationStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// One nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub message_id: MessageId,
    /// Cosine similarity in [-1, 1].
    pub score: f32,
}

/// Trait for vector stores.
///
/// Every backend scopes queries to the owner and returns matches sorted by
/// descending cosine similarity computed with [`cosine_similarity`].
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logs and status output.
    fn name(&self) -> &'static str;

    /// Dimension every stored vector must have.
    fn dimension(&self) -> usize;

    /// Identifier the backend stores the vector under.
    fn vector_id(&self, id: MessageId) -> String {
        id.vector_id()
    }

    /// Insert or overwrite the vector for a message.
    async fn upsert(&self, id: MessageId, vector: &[f32], owner: &OwnerId) -> Result<()>;

    /// Nearest neighbours of `vector` among the owner's vectors.
    async fn query(&self, vector: &[f32], limit: usize, owner: &OwnerId)
        -> Result<Vec<VectorMatch>>;

    /// Remove vectors. Unknown ids are ignored.
    async fn delete(&self, ids: &[MessageId]) -> Result<()>;
}

/// Score candidates against the query, sort descending and keep `limit`.
pub fn rank<I>(query: &[f32], candidates: I, limit: usize) -> Vec<VectorMatch>
where
    I: IntoIterator<Item = (MessageId, Vec<f32>)>,
{
    let mut matches: Vec<VectorMatch> = candidates
        .into_iter()
        .map(|(message_id, vector)| VectorMatch {
            message_id,
            score: cosine_similarity(query, &vector),
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.message_id.cmp(&b.message_id))
    });
    matches.truncate(limit);
    matches
}

/// Brute-force scan over vectors stored next to the message rows.
///
/// O(n) per query in the owner's message count.
pub struct InProcessVectorStore {
    history: Arc<dyn ConversationStore>,
    dimension: usize,
}

impl InProcessVectorStore {
    pub fn new(history: Arc<dyn ConversationStore>, dimension: usize) -> Self {
        Self { history, dimension }
    }
}

#[async_trait]
impl VectorStore for InProcessVectorStore {
    fn name(&self) -> &'static str {
        "in_process"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn upsert(&self, id: MessageId, vector: &[f32], owner: &OwnerId) -> Result<()> {
        MemoryError::check_dimension(self.dimension, vector.len())?;

        let entry = self
            .history
            .message(id)
            .await?
            .ok_or_else(|| MemoryError::Backend(format!("Message {} not found", id)))?;
        if &entry.owner != owner {
            return Err(MemoryError::Backend(format!(
                "Message {} is not owned by {}",
                id, owner
            )));
        }

        self.history.attach_embedding(id, vector.to_vec()).await?;
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        limit: usize,
        owner: &OwnerId,
    ) -> Result<Vec<VectorMatch>> {
        MemoryError::check_dimension(self.dimension, vector.len())?;

        let stored = self.history.embedded_messages(owner).await?;
        for (_, v) in &stored {
            MemoryError::check_dimension(self.dimension, v.len())?;
        }
        Ok(rank(vector, stored, limit))
    }

    async fn delete(&self, ids: &[MessageId]) -> Result<()> {
        for id in ids {
            self.history.detach_embedding(*id).await?;
        }
        Ok(())
    }
}
