//! Chat send flow.

use crate::error::{Result, ServiceError};
use crate::vault::ChatVault;
use chatvault_core::{Conversation, ConversationId, FolderId, Message, MessageId, Platform};
use chatvault_history::{ConversationStore, NewConversation, NewMessage};
use chatvault_providers::ChatTurn;
use serde::Serialize;
use tracing::{info, warn};

/// A user message to send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    /// Existing conversation; a new one is created when absent.
    pub conversation_id: Option<ConversationId>,
    pub platform: Platform,
    pub model: String,
    pub message: String,
    /// Folder for a newly created conversation.
    pub folder_id: Option<FolderId>,
}

impl SendRequest {
    pub fn new(platform: Platform, model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            platform,
            model: model.into(),
            message: message.into(),
            folder_id: None,
        }
    }

    pub fn in_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn in_folder(mut self, id: FolderId) -> Self {
        self.folder_id = Some(id);
        self
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, Serialize)]
pub struct SendOutcome {
    /// The conversation with updated totals.
    pub conversation: Conversation,
    pub user_message: Message,
    pub assistant_message: Message,
}

impl ChatVault {
    /// Send a message and persist the exchange.
    ///
    /// When the vendor call fails, the user message is removed again, and so
    /// is the conversation if this call created it. The provider error is
    /// returned unchanged.
    pub async fn send(&self, request: SendRequest) -> Result<SendOutcome> {
        if request.model.trim().is_empty() || request.message.trim().is_empty() {
            return Err(ServiceError::Invalid(
                "platform, model, and message are required".to_string(),
            ));
        }

        let api_key = self
            .history
            .active_api_key(&self.owner, request.platform)
            .await?
            .ok_or(ServiceError::MissingApiKey(request.platform))?;

        let (conversation, created) = match request.conversation_id {
            Some(id) => (self.history.get_conversation(&self.owner, id).await?, false),
            None => {
                let new = NewConversation::new(request.platform, request.model.clone())
                    .titled_from(&request.message)
                    .in_folder(request.folder_id);
                (self.history.create_conversation(&self.owner, new).await?, true)
            }
        };

        let user_message = self
            .history
            .append_message(&self.owner, conversation.id, NewMessage::user(request.message.clone()))
            .await?;

        let turns = ChatTurn::from_history(&self.history.history(&self.owner, conversation.id).await?);
        let reply = match self
            .providers
            .send(request.platform, &request.model, &api_key, &turns)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                self.roll_back(conversation.id, user_message.id, created).await;
                return Err(e.into());
            }
        };

        let assistant_message = self
            .history
            .append_message(
                &self.owner,
                conversation.id,
                NewMessage::assistant(reply.content)
                    .with_usage(reply.tokens, reply.cost)
                    .with_metadata(reply.metadata),
            )
            .await?;

        self.index(&user_message).await;
        self.index(&assistant_message).await;

        let conversation = self.history.get_conversation(&self.owner, conversation.id).await?;
        info!(
            conversation = %conversation.id,
            platform = %request.platform,
            tokens = reply.tokens,
            "Stored reply"
        );

        Ok(SendOutcome {
            conversation,
            user_message,
            assistant_message,
        })
    }

    async fn roll_back(&self, conversation: ConversationId, message: MessageId, created: bool) {
        let result = if created {
            self.history
                .delete_conversation(&self.owner, conversation)
                .await
                .map(|_| ())
        } else {
            self.history.delete_message(&self.owner, message).await
        };
        if let Err(e) = result {
            warn!(conversation = %conversation, "Rollback failed: {}", e);
        }
    }
}
