//! Persisted records.

use super::{ApiKeyId, ConversationId, FolderId, MessageId, OwnerId, Platform, Role, TagId};
use crate::secret::SecretString;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default folder colour.
pub const DEFAULT_FOLDER_COLOR: &str = "#667eea";

/// Default tag colour.
pub const DEFAULT_TAG_COLOR: &str = "#6c757d";

/// A conversation with one AI platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub owner: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub platform: Platform,
    pub model: String,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub total_cost: f64,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Title, or a placeholder when the conversation was never named.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled Conversation")
    }
}

/// A single message. Immutable once created, apart from its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

/// A folder grouping conversations. Folders may nest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub owner: OwnerId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FolderId>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A label attached to conversations. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub owner: OwnerId,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

/// A vendor API key. At most one per (owner, platform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiKeyRecord {
    pub id: ApiKeyId,
    pub owner: OwnerId,
    pub platform: Platform,
    pub api_key: SecretString,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Links a message to its entry in the vector store.
///
/// Exists only when indexing succeeded; removed with the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub message_id: MessageId,
    pub owner: OwnerId,
    pub vector_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_placeholder() {
        let now = Utc::now();
        let mut conv = Conversation {
            id: ConversationId::new(1),
            owner: OwnerId::default(),
            folder_id: None,
            title: None,
            platform: Platform::OpenAI,
            model: "gpt-4".to_string(),
            total_tokens: 0,
            total_cost: 0.0,
            tag_ids: vec![],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(conv.display_title(), "Untitled Conversation");
        conv.title = Some("Rust lifetimes".to_string());
        assert_eq!(conv.display_title(), "Rust lifetimes");
    }

    #[test]
    fn test_message_skips_empty_fields() {
        let msg = Message {
            id: MessageId::new(1),
            conversation_id: ConversationId::new(1),
            role: Role::User,
            content: "hi".to_string(),
            tokens: None,
            cost: None,
            metadata: Map::new(),
            embedding: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("embedding").is_none());
        assert!(json.get("metadata").is_none());
        assert_eq!(json["role"], "user");
    }
}
