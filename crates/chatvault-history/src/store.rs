//! Conversation and message persistence.

use crate::error::{HistoryError, Result};
use crate::state::HistoryState;
use crate::{DEFAULT_PAGE_SIZE, TITLE_CHARS};
use async_trait::async_trait;
use chatvault_core::{
    Conversation, ConversationId, FolderId, Message, MessageId, OwnerId, Platform, Role, TagId,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// The persistence contract chat sending and semantic search rely on.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Ordered message history of a conversation owned by `owner`.
    async fn history(&self, owner: &OwnerId, conversation: ConversationId) -> Result<Vec<Message>>;

    /// Append a message and fold its usage into the conversation totals.
    async fn append_message(
        &self,
        owner: &OwnerId,
        conversation: ConversationId,
        message: NewMessage,
    ) -> Result<Message>;

    /// Read a message together with its owner, for indexing and hydration.
    async fn message(&self, id: MessageId) -> Result<Option<MessageEntry>>;

    /// Store a vector next to the message row.
    async fn attach_embedding(&self, id: MessageId, vector: Vec<f32>) -> Result<()>;

    /// Drop the vector stored next to the message row, if any.
    async fn detach_embedding(&self, id: MessageId) -> Result<()>;

    /// All stored vectors for messages in conversations owned by `owner`.
    async fn embedded_messages(&self, owner: &OwnerId) -> Result<Vec<(MessageId, Vec<f32>)>>;
}

/// A message to append.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub tokens: Option<u64>,
    pub cost: Option<f64>,
    pub metadata: Map<String, Value>,
}

impl NewMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tokens: None,
            cost: None,
            metadata: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn with_usage(mut self, tokens: u64, cost: f64) -> Self {
        self.tokens = Some(tokens);
        self.cost = Some(cost);
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A message with the context needed to check ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEntry {
    pub message: Message,
    pub owner: OwnerId,
    pub conversation_title: Option<String>,
}

/// A conversation to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversation {
    pub platform: Platform,
    pub model: String,
    pub title: Option<String>,
    pub folder_id: Option<FolderId>,
}

impl NewConversation {
    pub fn new(platform: Platform, model: impl Into<String>) -> Self {
        Self {
            platform,
            model: model.into(),
            title: None,
            folder_id: None,
        }
    }

    /// Title from the first characters of an opening message.
    pub fn titled_from(mut self, first_message: &str) -> Self {
        let title: String = first_message.chars().take(TITLE_CHARS).collect();
        self.title = Some(title);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn in_folder(mut self, folder: Option<FolderId>) -> Self {
        self.folder_id = folder;
        self
    }
}

/// Partial update of a conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationUpdate {
    /// New title; an empty string clears it.
    pub title: Option<String>,
    /// `Some(None)` moves the conversation out of its folder.
    pub folder_id: Option<Option<FolderId>>,
    /// Replaces the tag set. Ids not owned by the user are ignored.
    pub tag_ids: Option<Vec<TagId>>,
}

/// Conversation listing filter. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationFilter {
    pub folder_id: Option<FolderId>,
    pub tag_id: Option<TagId>,
    pub platform: Option<Platform>,
    pub model: Option<String>,
    /// Case-insensitive match on the title or any message content.
    pub search: Option<String>,
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub pages: usize,
}

/// Conversation history store.
///
/// State lives in memory behind an async lock. When opened with a path, every
/// mutation is persisted with an atomic write (write to tmp, then rename).
pub struct HistoryStore {
    path: Option<PathBuf>,
    state: RwLock<HistoryState>,
}

impl HistoryStore {
    /// Create a store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(HistoryState::default()),
        }
    }

    /// Open a file-backed store. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            HistoryState::default()
        };

        tracing::debug!(path = %path.display(), "Opened history store");
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn save(&self, state: &HistoryState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("tmp");
        let data = serde_json::to_vec(state)?;
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    /// Run a mutation under the write lock and persist on success.
    ///
    /// The closure runs on a staged copy that replaces the live state only
    /// after it is saved, so any error leaves the store unchanged.
    pub(crate) async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut HistoryState) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.write().await;
        let mut staged = state.clone();
        let out = f(&mut staged)?;
        self.save(&staged).await?;
        *state = staged;
        Ok(out)
    }

    pub(crate) async fn read<T>(&self, f: impl FnOnce(&HistoryState) -> Result<T>) -> Result<T> {
        let state = self.state.read().await;
        f(&state)
    }

    /// Create a conversation.
    pub async fn create_conversation(
        &self,
        owner: &OwnerId,
        new: NewConversation,
    ) -> Result<Conversation> {
        if new.model.trim().is_empty() {
            return Err(HistoryError::Invalid("model is required".to_string()));
        }

        let conversation = self
            .mutate(|state| {
                if let Some(folder) = new.folder_id {
                    state.folder(owner, folder)?;
                }
                let now = Utc::now();
                let conversation = Conversation {
                    id: state.next_conversation_id(),
                    owner: owner.clone(),
                    folder_id: new.folder_id,
                    title: new.title.filter(|t| !t.trim().is_empty()),
                    platform: new.platform,
                    model: new.model,
                    total_tokens: 0,
                    total_cost: 0.0,
                    tag_ids: Vec::new(),
                    created_at: now,
                    updated_at: now,
                };
                state
                    .conversations
                    .insert(conversation.id, conversation.clone());
                Ok(conversation)
            })
            .await?;

        tracing::info!(conversation = %conversation.id, platform = %conversation.platform, "Created conversation");
        Ok(conversation)
    }

    /// Get a conversation owned by `owner`.
    pub async fn get_conversation(
        &self,
        owner: &OwnerId,
        id: ConversationId,
    ) -> Result<Conversation> {
        self.read(|state| state.conversation(owner, id).cloned()).await
    }

    /// Get a conversation with its ordered messages.
    pub async fn conversation_with_messages(
        &self,
        owner: &OwnerId,
        id: ConversationId,
    ) -> Result<(Conversation, Vec<Message>)> {
        self.read(|state| {
            let conversation = state.conversation(owner, id)?.clone();
            let messages = state.messages_of(id).cloned().collect();
            Ok((conversation, messages))
        })
        .await
    }

    /// List conversations, most recently updated first.
    pub async fn list_conversations(
        &self,
        owner: &OwnerId,
        filter: &ConversationFilter,
        page: Page,
    ) -> Result<Paginated<Conversation>> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        self.read(|state| {
            let mut matching: Vec<&Conversation> = state
                .conversations
                .values()
                .filter(|c| &c.owner == owner)
                .filter(|c| filter.folder_id.map_or(true, |f| c.folder_id == Some(f)))
                .filter(|c| filter.tag_id.map_or(true, |t| c.tag_ids.contains(&t)))
                .filter(|c| filter.platform.map_or(true, |p| c.platform == p))
                .filter(|c| filter.model.as_deref().map_or(true, |m| c.model == m))
                .filter(|c| match &needle {
                    None => true,
                    Some(needle) => {
                        c.title
                            .as_deref()
                            .is_some_and(|t| t.to_lowercase().contains(needle))
                            || state
                                .messages_of(c.id)
                                .any(|m| m.content.to_lowercase().contains(needle))
                    }
                })
                .collect();

            matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

            let per_page = page.per_page.max(1);
            let page_no = page.page.max(1);
            let total = matching.len();
            let items = matching
                .into_iter()
                .skip((page_no - 1) * per_page)
                .take(per_page)
                .cloned()
                .collect();

            Ok(Paginated {
                items,
                total,
                page: page_no,
                per_page,
                pages: total.div_ceil(per_page),
            })
        })
        .await
    }

    /// Apply a partial update.
    pub async fn update_conversation(
        &self,
        owner: &OwnerId,
        id: ConversationId,
        update: ConversationUpdate,
    ) -> Result<Conversation> {
        self.mutate(|state| {
            state.conversation(owner, id)?;
            if let Some(Some(folder)) = update.folder_id {
                state.folder(owner, folder)?;
            }
            let tag_ids = update.tag_ids.map(|ids| {
                let mut owned: Vec<TagId> = ids
                    .into_iter()
                    .filter(|t| state.tag(owner, *t).is_ok())
                    .collect();
                owned.sort();
                owned.dedup();
                owned
            });

            let conversation = state.conversation_mut(owner, id)?;
            if let Some(title) = update.title {
                conversation.title = Some(title).filter(|t| !t.trim().is_empty());
            }
            if let Some(folder) = update.folder_id {
                conversation.folder_id = folder;
            }
            if let Some(tag_ids) = tag_ids {
                conversation.tag_ids = tag_ids;
            }
            conversation.updated_at = Utc::now();
            Ok(conversation.clone())
        })
        .await
    }

    /// Delete a conversation with its messages and embedding records.
    ///
    /// Returns the ids of the removed messages so their vectors can be dropped.
    pub async fn delete_conversation(
        &self,
        owner: &OwnerId,
        id: ConversationId,
    ) -> Result<Vec<MessageId>> {
        let removed = self
            .mutate(|state| {
                state.conversation(owner, id)?;
                let ids: Vec<MessageId> = state.messages_of(id).map(|m| m.id).collect();
                for message in &ids {
                    state.remove_message(*message);
                }
                state.conversations.remove(&id);
                Ok(ids)
            })
            .await?;

        tracing::info!(conversation = %id, messages = removed.len(), "Deleted conversation");
        Ok(removed)
    }

    /// Delete one message, reversing its contribution to the conversation totals.
    pub async fn delete_message(&self, owner: &OwnerId, id: MessageId) -> Result<()> {
        self.mutate(|state| {
            let conversation_id = state
                .messages
                .get(&id)
                .filter(|m| state.message_owner(m) == Some(owner))
                .map(|m| m.conversation_id)
                .ok_or_else(|| HistoryError::not_found("Message", id))?;

            if let Some(message) = state.remove_message(id) {
                let conversation = state.conversation_mut(owner, conversation_id)?;
                conversation.total_tokens = conversation
                    .total_tokens
                    .saturating_sub(message.tokens.unwrap_or(0));
                conversation.total_cost =
                    (conversation.total_cost - message.cost.unwrap_or(0.0)).max(0.0);
            }
            Ok(())
        })
        .await
    }

    /// Number of conversations across all owners.
    pub async fn conversation_count(&self) -> usize {
        self.state.read().await.conversations.len()
    }
}

#[async_trait]
impl ConversationStore for HistoryStore {
    async fn history(&self, owner: &OwnerId, conversation: ConversationId) -> Result<Vec<Message>> {
        self.read(|state| {
            state.conversation(owner, conversation)?;
            Ok(state.messages_of(conversation).cloned().collect())
        })
        .await
    }

    async fn append_message(
        &self,
        owner: &OwnerId,
        conversation: ConversationId,
        message: NewMessage,
    ) -> Result<Message> {
        self.mutate(|state| {
            state.conversation(owner, conversation)?;
            let now = Utc::now();
            let stored = Message {
                id: state.next_message_id(),
                conversation_id: conversation,
                role: message.role,
                content: message.content,
                tokens: message.tokens,
                cost: message.cost,
                metadata: message.metadata,
                embedding: None,
                created_at: now,
            };

            let conv = state.conversation_mut(owner, conversation)?;
            conv.total_tokens += stored.tokens.unwrap_or(0);
            conv.total_cost += stored.cost.unwrap_or(0.0);
            conv.updated_at = now;

            state.messages.insert(stored.id, stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn message(&self, id: MessageId) -> Result<Option<MessageEntry>> {
        self.read(|state| {
            Ok(state.messages.get(&id).and_then(|message| {
                state
                    .conversations
                    .get(&message.conversation_id)
                    .map(|conv| MessageEntry {
                        message: message.clone(),
                        owner: conv.owner.clone(),
                        conversation_title: conv.title.clone(),
                    })
            }))
        })
        .await
    }

    async fn attach_embedding(&self, id: MessageId, vector: Vec<f32>) -> Result<()> {
        self.mutate(|state| {
            let message = state
                .messages
                .get_mut(&id)
                .ok_or_else(|| HistoryError::not_found("Message", id))?;
            message.embedding = Some(vector);
            Ok(())
        })
        .await
    }

    async fn detach_embedding(&self, id: MessageId) -> Result<()> {
        self.mutate(|state| {
            if let Some(message) = state.messages.get_mut(&id) {
                message.embedding = None;
            }
            Ok(())
        })
        .await
    }

    async fn embedded_messages(&self, owner: &OwnerId) -> Result<Vec<(MessageId, Vec<f32>)>> {
        self.read(|state| {
            Ok(state
                .messages
                .values()
                .filter(|m| state.message_owner(m) == Some(owner))
                .filter_map(|m| m.embedding.as_ref().map(|v| (m.id, v.clone())))
                .collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> OwnerId {
        OwnerId::new("alice")
    }

    fn bob() -> OwnerId {
        OwnerId::new("bob")
    }

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();

        for text in ["one", "two", "three"] {
            store
                .append_message(&alice(), conv.id, NewMessage::user(text))
                .await
                .unwrap();
        }

        let history = store.history(&alice(), conv.id).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_append_updates_totals() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::Anthropic, "claude-3-haiku-20240307"))
            .await
            .unwrap();

        store
            .append_message(&alice(), conv.id, NewMessage::user("hi"))
            .await
            .unwrap();
        store
            .append_message(&alice(), conv.id, NewMessage::assistant("hello").with_usage(120, 0.01))
            .await
            .unwrap();

        let conv = store.get_conversation(&alice(), conv.id).await.unwrap();
        assert_eq!(conv.total_tokens, 120);
        assert!((conv.total_cost - 0.01).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_history_rejects_other_owner() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::Google, "gemini-pro"))
            .await
            .unwrap();

        let err = store.history(&bob(), conv.id).await.unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .append_message(&bob(), conv.id, NewMessage::user("sneaky"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_titled_from_truncates() {
        let long = "x".repeat(250);
        let new = NewConversation::new(Platform::OpenAI, "gpt-4").titled_from(&long);
        assert_eq!(new.title.unwrap().chars().count(), TITLE_CHARS);
    }

    #[tokio::test]
    async fn test_message_entry_carries_owner() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(
                &alice(),
                NewConversation::new(Platform::OpenAI, "gpt-4").with_title("Plans"),
            )
            .await
            .unwrap();
        let msg = store
            .append_message(&alice(), conv.id, NewMessage::user("trip to Lisbon"))
            .await
            .unwrap();

        let entry = store.message(msg.id).await.unwrap().unwrap();
        assert_eq!(entry.owner, alice());
        assert_eq!(entry.conversation_title.as_deref(), Some("Plans"));
        assert!(store.message(MessageId::new(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_embedded_messages_scoped_to_owner() {
        let store = HistoryStore::in_memory();
        let a = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let b = store
            .create_conversation(&bob(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let ma = store.append_message(&alice(), a.id, NewMessage::user("a")).await.unwrap();
        let mb = store.append_message(&bob(), b.id, NewMessage::user("b")).await.unwrap();
        let unindexed = store.append_message(&alice(), a.id, NewMessage::user("c")).await.unwrap();

        store.attach_embedding(ma.id, vec![1.0, 0.0]).await.unwrap();
        store.attach_embedding(mb.id, vec![0.0, 1.0]).await.unwrap();

        let alice_vectors = store.embedded_messages(&alice()).await.unwrap();
        assert_eq!(alice_vectors, vec![(ma.id, vec![1.0, 0.0])]);
        assert!(!alice_vectors.iter().any(|(id, _)| *id == unindexed.id));

        store.detach_embedding(ma.id).await.unwrap();
        assert!(store.embedded_messages(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates() {
        let store = HistoryStore::in_memory();
        for i in 0..5 {
            let platform = if i % 2 == 0 { Platform::OpenAI } else { Platform::Google };
            let conv = store
                .create_conversation(
                    &alice(),
                    NewConversation::new(platform, "m").with_title(format!("conv {}", i)),
                )
                .await
                .unwrap();
            store
                .append_message(&alice(), conv.id, NewMessage::user(format!("body {}", i)))
                .await
                .unwrap();
        }
        store
            .create_conversation(&bob(), NewConversation::new(Platform::OpenAI, "m"))
            .await
            .unwrap();

        let filter = ConversationFilter {
            platform: Some(Platform::OpenAI),
            ..Default::default()
        };
        let page = store
            .list_conversations(&alice(), &filter, Page { page: 1, per_page: 2 })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].title.as_deref(), Some("conv 4"));

        let filter = ConversationFilter {
            search: Some("BODY 3".to_string()),
            ..Default::default()
        };
        let page = store
            .list_conversations(&alice(), &filter, Page::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].title.as_deref(), Some("conv 3"));
    }

    #[tokio::test]
    async fn test_delete_conversation_cascades() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let m1 = store.append_message(&alice(), conv.id, NewMessage::user("x")).await.unwrap();
        let m2 = store.append_message(&alice(), conv.id, NewMessage::assistant("y")).await.unwrap();

        assert!(store.delete_conversation(&bob(), conv.id).await.is_err());

        let removed = store.delete_conversation(&alice(), conv.id).await.unwrap();
        assert_eq!(removed, vec![m1.id, m2.id]);
        assert!(store.message(m1.id).await.unwrap().is_none());
        assert!(store.get_conversation(&alice(), conv.id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_message_reverses_totals() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let msg = store
            .append_message(&alice(), conv.id, NewMessage::assistant("y").with_usage(10, 0.5))
            .await
            .unwrap();

        assert!(store.delete_message(&bob(), msg.id).await.is_err());
        store.delete_message(&alice(), msg.id).await.unwrap();

        let conv = store.get_conversation(&alice(), conv.id).await.unwrap();
        assert_eq!(conv.total_tokens, 0);
        assert_eq!(conv.total_cost, 0.0);
    }

    #[tokio::test]
    async fn test_file_store_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let (conv_id, msg_id) = {
            let store = HistoryStore::open(&path).unwrap();
            let conv = store
                .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
                .await
                .unwrap();
            let msg = store
                .append_message(&alice(), conv.id, NewMessage::user("persistent"))
                .await
                .unwrap();
            store.attach_embedding(msg.id, vec![0.5, 0.5]).await.unwrap();
            (conv.id, msg.id)
        };

        let store = HistoryStore::open(&path).unwrap();
        let history = store.history(&alice(), conv_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "persistent");
        assert_eq!(history[0].embedding, Some(vec![0.5, 0.5]));

        // Ids keep increasing after reopen
        let next = store
            .append_message(&alice(), conv_id, NewMessage::user("next"))
            .await
            .unwrap();
        assert!(next.id > msg_id);
        assert!(!path.with_extension("tmp").exists());
        assert!(!std::fs::read_to_string(&path).unwrap().contains('\n'));
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let store = HistoryStore::open(&path).unwrap();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();

        // A directory at the tmp path makes every write fail
        std::fs::create_dir(path.with_extension("tmp")).unwrap();

        let created = store
            .create_conversation(&alice(), NewConversation::new(Platform::Google, "gemini-pro"))
            .await;
        assert!(created.is_err());
        let appended = store
            .append_message(&alice(), conv.id, NewMessage::user("lost"))
            .await;
        assert!(appended.is_err());

        assert_eq!(store.conversation_count().await, 1);
        assert!(store.history(&alice(), conv.id).await.unwrap().is_empty());
        let page = store
            .list_conversations(&alice(), &ConversationFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_update_conversation() {
        let store = HistoryStore::in_memory();
        let conv = store
            .create_conversation(&alice(), NewConversation::new(Platform::OpenAI, "gpt-4"))
            .await
            .unwrap();
        let mine = store.create_tag(&alice(), "work", None).await.unwrap();
        let theirs = store.create_tag(&bob(), "secret", None).await.unwrap();
        let folder = store.create_folder(&alice(), "Projects", None, None).await.unwrap();

        let updated = store
            .update_conversation(
                &alice(),
                conv.id,
                ConversationUpdate {
                    title: Some("Renamed".to_string()),
                    folder_id: Some(Some(folder.id)),
                    tag_ids: Some(vec![mine.id, theirs.id]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title.as_deref(), Some("Renamed"));
        assert_eq!(updated.folder_id, Some(folder.id));
        assert_eq!(updated.tag_ids, vec![mine.id]);

        let cleared = store
            .update_conversation(
                &alice(),
                conv.id,
                ConversationUpdate {
                    title: Some(String::new()),
                    folder_id: Some(None),
                    tag_ids: None,
                },
            )
            .await
            .unwrap();
        assert!(cleared.title.is_none());
        assert!(cleared.folder_id.is_none());
        assert_eq!(cleared.tag_ids, vec![mine.id]);
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_folder() {
        let store = HistoryStore::in_memory();
        let folder = store.create_folder(&bob(), "Bob's", None, None).await.unwrap();
        let err = store
            .create_conversation(
                &alice(),
                NewConversation::new(Platform::OpenAI, "gpt-4").in_folder(Some(folder.id)),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
