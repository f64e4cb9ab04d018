//! Transcript import.

use crate::error::{HistoryError, Result};
use crate::store::{ConversationStore, HistoryStore, NewConversation, NewMessage};
use chatvault_core::{Conversation, FolderId, Message, OwnerId, Platform, Role};
use serde::Deserialize;

/// A transcript exported from a chat product.
///
/// ```json
/// { "platform": "claude", "model": "claude-3-opus-20240229", "title": "Notes",
///   "messages": [{ "role": "user", "content": "hi" }] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ImportedConversation {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub folder_id: Option<FolderId>,
    #[serde(default)]
    pub messages: Vec<ImportedMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub tokens: Option<u64>,
    #[serde(default)]
    pub cost: Option<f64>,
}

impl ImportedConversation {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check required fields and resolve the platform and roles.
    fn resolve(&self) -> Result<(Platform, Vec<NewMessage>)> {
        if self.platform.trim().is_empty() || self.model.trim().is_empty() {
            return Err(HistoryError::Invalid(
                "Platform and model are required".to_string(),
            ));
        }
        let platform: Platform = self.platform.parse()?;

        let messages = self
            .messages
            .iter()
            .map(|m| -> Result<NewMessage> {
                let role: Role = m.role.parse()?;
                let mut message = NewMessage::new(role, m.content.clone());
                message.tokens = m.tokens;
                message.cost = m.cost;
                Ok(message)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((platform, messages))
    }
}

impl HistoryStore {
    /// Import a transcript as a new conversation.
    pub async fn import_conversation(
        &self,
        owner: &OwnerId,
        imported: ImportedConversation,
    ) -> Result<(Conversation, Vec<Message>)> {
        let (platform, messages) = imported.resolve()?;

        let mut new = NewConversation::new(platform, imported.model.trim()).in_folder(imported.folder_id);
        new = match imported.title.filter(|t| !t.trim().is_empty()) {
            Some(title) => new.with_title(title),
            None => match messages.iter().find(|m| m.role == Role::User) {
                Some(first) => new.titled_from(&first.content),
                None => new,
            },
        };

        let conversation = self.create_conversation(owner, new).await?;
        let mut stored = Vec::with_capacity(messages.len());
        for message in messages {
            stored.push(self.append_message(owner, conversation.id, message).await?);
        }

        let conversation = self.get_conversation(owner, conversation.id).await?;
        tracing::info!(
            conversation = %conversation.id,
            messages = stored.len(),
            "Imported conversation"
        );
        Ok((conversation, stored))
    }
}
