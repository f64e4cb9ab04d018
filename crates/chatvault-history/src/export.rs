//! Transcript export.

use crate::error::{HistoryError, Result};
use crate::store::HistoryStore;
use chatvault_core::{Conversation, ConversationId, Message, OwnerId, Role};
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Markdown => "text/markdown",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            other => Err(HistoryError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A rendered export.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

#[derive(Serialize)]
struct ConversationDocument<'a> {
    #[serde(flatten)]
    conversation: &'a Conversation,
    messages: Vec<MessageDocument<'a>>,
}

#[derive(Serialize)]
struct MessageDocument<'a> {
    id: chatvault_core::MessageId,
    role: Role,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
    created_at: String,
}

impl<'a> ConversationDocument<'a> {
    fn new(conversation: &'a Conversation, messages: &'a [Message]) -> Self {
        Self {
            conversation,
            messages: messages
                .iter()
                .map(|m| MessageDocument {
                    id: m.id,
                    role: m.role,
                    content: &m.content,
                    tokens: m.tokens,
                    cost: m.cost,
                    created_at: m.created_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

fn role_icon(role: Role) -> &'static str {
    if role == Role::User {
        "👤"
    } else {
        "🤖"
    }
}

/// Render one conversation as JSON.
pub fn render_json(conversation: &Conversation, messages: &[Message]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ConversationDocument::new(
        conversation,
        messages,
    ))?)
}

/// Render one conversation as CSV with a `Role, Content, Tokens, Created At` header.
pub fn render_csv(messages: &[Message]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Role", "Content", "Tokens", "Created At"])?;
    for message in messages {
        let tokens = message.tokens.map(|t| t.to_string()).unwrap_or_default();
        writer.write_record([
            message.role.as_str(),
            message.content.as_str(),
            tokens.as_str(),
            message.created_at.to_rfc3339().as_str(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| HistoryError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| HistoryError::Invalid(e.to_string()))
}

/// Render one conversation as a Markdown transcript.
pub fn render_markdown(conversation: &Conversation, messages: &[Message]) -> String {
    let mut md = String::new();
    let _ = write!(md, "# {}\n\n", conversation.display_title());
    let _ = write!(md, "**Platform:** {}  \n", conversation.platform);
    let _ = write!(md, "**Model:** {}  \n", conversation.model);
    let _ = write!(md, "**Created:** {}  \n\n", conversation.created_at.to_rfc3339());
    md.push_str("---\n\n");

    for message in messages {
        let _ = write!(md, "## {} {}\n\n", role_icon(message.role), message.role.title());
        let _ = write!(md, "{}\n\n", message.content);
        md.push_str("---\n\n");
    }
    md
}

/// Render several conversations as one Markdown document.
pub fn render_bulk_markdown(conversations: &[(Conversation, Vec<Message>)]) -> String {
    let mut md = String::from("# Exported Conversations\n\n");
    for (conversation, messages) in conversations {
        let title = conversation
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Conversation {}", conversation.id));
        let _ = write!(md, "## {}\n\n", title);
        let _ = write!(
            md,
            "**Platform:** {} | **Model:** {}  \n\n",
            conversation.platform, conversation.model
        );
        for message in messages {
            let _ = write!(
                md,
                "### {} {}\n\n{}\n\n",
                role_icon(message.role),
                message.role.title(),
                message.content
            );
        }
        md.push_str("---\n\n");
    }
    md
}

impl HistoryStore {
    /// Export one conversation owned by `owner`.
    pub async fn export_conversation(
        &self,
        owner: &OwnerId,
        id: ConversationId,
        format: ExportFormat,
    ) -> Result<Export> {
        let (conversation, messages) = self.conversation_with_messages(owner, id).await?;
        let body = match format {
            ExportFormat::Json => render_json(&conversation, &messages)?,
            ExportFormat::Csv => render_csv(&messages)?,
            ExportFormat::Markdown => render_markdown(&conversation, &messages),
        };
        Ok(Export {
            filename: format!("conversation_{}.{}", id, format.extension()),
            content_type: format.content_type(),
            body,
        })
    }

    /// Export several conversations. Ids that are unknown or not owned are skipped.
    ///
    /// Only JSON and Markdown are supported.
    pub async fn export_bulk(
        &self,
        owner: &OwnerId,
        ids: &[ConversationId],
        format: ExportFormat,
    ) -> Result<Export> {
        if format == ExportFormat::Csv {
            return Err(HistoryError::UnsupportedFormat(
                "csv is not available for bulk export".to_string(),
            ));
        }

        let mut selected = Vec::new();
        for id in ids {
            match self.conversation_with_messages(owner, *id).await {
                Ok(pair) => selected.push(pair),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(conversation = %id, "Skipping conversation in bulk export");
                }
                Err(e) => return Err(e),
            }
        }

        let body = match format {
            ExportFormat::Json => {
                let documents: Vec<ConversationDocument<'_>> = selected
                    .iter()
                    .map(|(c, m)| ConversationDocument::new(c, m))
                    .collect();
                serde_json::to_string_pretty(&serde_json::json!({ "conversations": documents }))?
            }
            _ => render_bulk_markdown(&selected),
        };
        Ok(Export {
            filename: format!("conversations_export.{}", format.extension()),
            content_type: format.content_type(),
            body,
        })
    }
}
