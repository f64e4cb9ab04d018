//! Serializable store state.

use crate::error::{HistoryError, Result};
use chatvault_core::{
    ApiKeyId, ApiKeyRecord, Conversation, ConversationId, EmbeddingRecord, Folder, FolderId,
    Message, MessageId, OwnerId, Tag, TagId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Last allocated id per record kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Counters {
    #[serde(default)]
    pub conversation: u64,
    #[serde(default)]
    pub message: u64,
    #[serde(default)]
    pub folder: u64,
    #[serde(default)]
    pub tag: u64,
    #[serde(default)]
    pub api_key: u64,
}

/// Everything the history file holds.
///
/// Messages are keyed by their monotonically allocated id, so iterating the
/// map yields insertion (chronological) order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct HistoryState {
    #[serde(default)]
    pub counters: Counters,
    #[serde(default)]
    pub conversations: BTreeMap<ConversationId, Conversation>,
    #[serde(default)]
    pub messages: BTreeMap<MessageId, Message>,
    #[serde(default)]
    pub folders: BTreeMap<FolderId, Folder>,
    #[serde(default)]
    pub tags: BTreeMap<TagId, Tag>,
    #[serde(default)]
    pub api_keys: BTreeMap<ApiKeyId, ApiKeyRecord>,
    #[serde(default)]
    pub embeddings: BTreeMap<MessageId, EmbeddingRecord>,
}

impl HistoryState {
    pub fn next_conversation_id(&mut self) -> ConversationId {
        self.counters.conversation += 1;
        ConversationId::new(self.counters.conversation)
    }

    pub fn next_message_id(&mut self) -> MessageId {
        self.counters.message += 1;
        MessageId::new(self.counters.message)
    }

    pub fn next_folder_id(&mut self) -> FolderId {
        self.counters.folder += 1;
        FolderId::new(self.counters.folder)
    }

    pub fn next_tag_id(&mut self) -> TagId {
        self.counters.tag += 1;
        TagId::new(self.counters.tag)
    }

    pub fn next_api_key_id(&mut self) -> ApiKeyId {
        self.counters.api_key += 1;
        ApiKeyId::new(self.counters.api_key)
    }

    pub fn conversation(&self, owner: &OwnerId, id: ConversationId) -> Result<&Conversation> {
        self.conversations
            .get(&id)
            .filter(|c| &c.owner == owner)
            .ok_or_else(|| HistoryError::not_found("Conversation", id))
    }

    pub fn conversation_mut(
        &mut self,
        owner: &OwnerId,
        id: ConversationId,
    ) -> Result<&mut Conversation> {
        self.conversations
            .get_mut(&id)
            .filter(|c| &c.owner == owner)
            .ok_or_else(|| HistoryError::not_found("Conversation", id))
    }

    pub fn folder(&self, owner: &OwnerId, id: FolderId) -> Result<&Folder> {
        self.folders
            .get(&id)
            .filter(|f| &f.owner == owner)
            .ok_or_else(|| HistoryError::not_found("Folder", id))
    }

    pub fn tag(&self, owner: &OwnerId, id: TagId) -> Result<&Tag> {
        self.tags
            .get(&id)
            .filter(|t| &t.owner == owner)
            .ok_or_else(|| HistoryError::not_found("Tag", id))
    }

    /// Messages of one conversation in insertion order.
    pub fn messages_of(&self, conversation: ConversationId) -> impl Iterator<Item = &Message> {
        self.messages
            .values()
            .filter(move |m| m.conversation_id == conversation)
    }

    /// Owner of a message, through its conversation.
    pub fn message_owner(&self, message: &Message) -> Option<&OwnerId> {
        self.conversations
            .get(&message.conversation_id)
            .map(|c| &c.owner)
    }

    /// Remove a message with its embedding record.
    pub fn remove_message(&mut self, id: MessageId) -> Option<Message> {
        self.embeddings.remove(&id);
        self.messages.remove(&id)
    }
}
