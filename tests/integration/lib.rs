//! Shared fixtures for the integration tests.

use chatvault_core::{ConversationId, MessageId, OwnerId, Platform};
use chatvault_history::{ConversationStore, HistoryStore, NewConversation, NewMessage};

/// Create a conversation for `owner` holding one user message per text.
pub async fn conversation_with(
    history: &HistoryStore,
    owner: &OwnerId,
    texts: &[&str],
) -> (ConversationId, Vec<MessageId>) {
    let conversation = history
        .create_conversation(owner, NewConversation::new(Platform::OpenAI, "gpt-4"))
        .await
        .expect("create conversation");

    let mut ids = Vec::with_capacity(texts.len());
    for text in texts {
        let message = history
            .append_message(owner, conversation.id, NewMessage::user(*text))
            .await
            .expect("append message");
        ids.push(message.id);
    }
    (conversation.id, ids)
}
