//! Keyword search and embedding records.

use crate::error::{HistoryError, Result};
use crate::store::HistoryStore;
use chatvault_core::{ConversationId, EmbeddingRecord, MessageId, OwnerId, Role};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Characters of message content kept in a search snippet.
pub const SNIPPET_CHARS: usize = 200;

/// Content shortened for result listings: the first 200 characters, with
/// `...` appended when anything was cut.
pub fn snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// A message matched by keyword or semantic search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageHit {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub conversation_title: Option<String>,
    pub snippet: String,
    pub role: Role,
    /// Similarity for semantic hits; absent for keyword hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl HistoryStore {
    /// Case-insensitive substring search over the owner's messages.
    pub async fn text_search(
        &self,
        owner: &OwnerId,
        query: &str,
        limit: usize,
    ) -> Result<Vec<MessageHit>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(HistoryError::Invalid("Search query is required".to_string()));
        }

        self.read(|state| {
            Ok(state
                .messages
                .values()
                .filter(|m| m.content.to_lowercase().contains(&needle))
                .filter_map(|m| {
                    let conversation = state
                        .conversations
                        .get(&m.conversation_id)
                        .filter(|c| &c.owner == owner)?;
                    Some(MessageHit {
                        message_id: m.id,
                        conversation_id: m.conversation_id,
                        conversation_title: conversation.title.clone(),
                        snippet: snippet(&m.content),
                        role: m.role,
                        score: None,
                        created_at: m.created_at,
                    })
                })
                .take(limit)
                .collect())
        })
        .await
    }

    /// Record that a message was indexed into the vector store.
    pub async fn record_embedding(
        &self,
        owner: &OwnerId,
        message_id: MessageId,
        vector_id: impl Into<String>,
    ) -> Result<EmbeddingRecord> {
        let vector_id = vector_id.into();
        self.mutate(|state| {
            let owned = state
                .messages
                .get(&message_id)
                .is_some_and(|m| state.message_owner(m) == Some(owner));
            if !owned {
                return Err(HistoryError::not_found("Message", message_id));
            }
            let record = EmbeddingRecord {
                message_id,
                owner: owner.clone(),
                vector_id,
                created_at: Utc::now(),
            };
            state.embeddings.insert(message_id, record.clone());
            Ok(record)
        })
        .await
    }

    /// Embedding records of the owner, by message id.
    pub async fn embedding_records(&self, owner: &OwnerId) -> Result<Vec<EmbeddingRecord>> {
        self.read(|state| {
            Ok(state
                .embeddings
                .values()
                .filter(|r| &r.owner == owner)
                .cloned()
                .collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConversationStore, NewConversation, NewMessage};
    use chatvault_core::Platform;

    #[test]
    fn test_snippet() {
        assert_eq!(snippet("short"), "short");
        let exact = "a".repeat(200);
        assert_eq!(snippet(&exact), exact);
        let long = "é".repeat(201);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 203);
    }

    #[tokio::test]
    async fn test_text_search_scoped_and_limited() {
        let store = HistoryStore::in_memory();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");
        let a = store
            .create_conversation(&alice, NewConversation::new(Platform::OpenAI, "gpt-4").with_title("Rust"))
            .await
            .unwrap();
        let b = store
            .create_conversation(&bob, NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();

        for i in 0..3 {
            store
                .append_message(&alice, a.id, NewMessage::user(format!("Borrow checker #{}", i)))
                .await
                .unwrap();
        }
        store
            .append_message(&bob, b.id, NewMessage::user("borrow checker for bob"))
            .await
            .unwrap();

        let hits = store.text_search(&alice, "BORROW", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.conversation_id == a.id));
        assert_eq!(hits[0].conversation_title.as_deref(), Some("Rust"));
        assert_eq!(hits[0].snippet, "Borrow checker #0");

        assert!(store.text_search(&alice, "  ", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_embedding_records_follow_message() {
        let store = HistoryStore::in_memory();
        let alice = OwnerId::new("alice");
        let conv = store
            .create_conversation(&alice, NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let msg = store
            .append_message(&alice, conv.id, NewMessage::user("index me"))
            .await
            .unwrap();

        assert!(store
            .record_embedding(&OwnerId::new("bob"), msg.id, msg.id.vector_id())
            .await
            .is_err());

        let record = store
            .record_embedding(&alice, msg.id, msg.id.vector_id())
            .await
            .unwrap();
        assert_eq!(record.vector_id, "msg-1");
        assert_eq!(store.embedding_records(&alice).await.unwrap().len(), 1);

        store.delete_message(&alice, msg.id).await.unwrap();
        assert!(store.embedding_records(&alice).await.unwrap().is_empty());
    }
}
