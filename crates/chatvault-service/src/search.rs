//! Hydrated semantic and keyword search.

use crate::error::{Result, ServiceError};
use crate::vault::ChatVault;
use chatvault_history::{snippet, ConversationStore, MessageHit};
use tracing::debug;

impl ChatVault {
    /// Semantic search over the owner's messages, best match first.
    ///
    /// Hits whose message is gone or belongs to someone else are dropped.
    pub async fn semantic_search(&self, query: &str, limit: Option<usize>) -> Result<Vec<MessageHit>> {
        if query.trim().is_empty() {
            return Err(ServiceError::Invalid("Query is required".to_string()));
        }
        let limit = limit.unwrap_or(self.default_limit);

        let matches = self.search.search(&self.owner, query, limit).await?;
        let mut hits = Vec::with_capacity(matches.len());
        for hit in matches {
            let entry = match self.history.message(hit.message_id).await? {
                Some(entry) if entry.owner == self.owner => entry,
                Some(_) => {
                    debug!(message = %hit.message_id, "Dropped search hit owned by another user");
                    continue;
                }
                None => {
                    debug!(message = %hit.message_id, "Dropped search hit for a deleted message");
                    continue;
                }
            };

            hits.push(MessageHit {
                message_id: entry.message.id,
                conversation_id: entry.message.conversation_id,
                conversation_title: entry.conversation_title,
                snippet: snippet(&entry.message.content),
                role: entry.message.role,
                score: Some(hit.score),
                created_at: entry.message.created_at,
            });
        }
        Ok(hits)
    }

    /// Case-insensitive keyword search.
    pub async fn text_search(&self, query: &str, limit: Option<usize>) -> Result<Vec<MessageHit>> {
        if query.trim().is_empty() {
            return Err(ServiceError::Invalid("Query is required".to_string()));
        }
        let limit = limit.unwrap_or(chatvault_history::DEFAULT_TEXT_SEARCH_LIMIT);
        Ok(self.history.text_search(&self.owner, query, limit).await?)
    }
}
