//! Conversation browsing and organization.

use super::parse_platform;
use crate::render::{self, Output};
use chatvault_core::{ConversationId, FolderId, Platform, TagId};
use chatvault_history::{ConversationFilter, ConversationUpdate, Page, DEFAULT_PAGE_SIZE};
use chatvault_service::ChatVault;
use clap::Args;
use console::style;

/// Conversations command arguments.
#[derive(Args)]
pub struct ConversationsArgs {
    #[command(subcommand)]
    pub command: ConversationsCommand,
}

#[derive(clap::Subcommand)]
pub enum ConversationsCommand {
    /// List conversations, most recently updated first
    List {
        /// Only conversations in this folder
        #[arg(long)]
        folder: Option<FolderId>,

        /// Only conversations carrying this tag
        #[arg(long)]
        tag: Option<TagId>,

        /// Only conversations with this platform
        #[arg(long, value_parser = parse_platform)]
        platform: Option<Platform>,

        /// Only conversations with this model
        #[arg(long)]
        model: Option<String>,

        /// Match titles and message text
        #[arg(short, long)]
        search: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Conversations per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        per_page: usize,
    },

    /// Show a conversation with its messages
    Show {
        id: ConversationId,
    },

    /// Set or clear a conversation title
    Rename {
        id: ConversationId,

        /// New title; empty clears it
        title: String,
    },

    /// Move a conversation into a folder, or out of any folder when omitted
    Move {
        id: ConversationId,

        /// Target folder
        folder: Option<FolderId>,
    },

    /// Replace the tags of a conversation
    Tag {
        id: ConversationId,

        /// Tag ids; none clears every tag
        tags: Vec<TagId>,
    },

    /// Delete a conversation and its messages
    Delete {
        id: ConversationId,
    },
}

/// Run the conversations command.
pub async fn run(args: ConversationsArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let owner = vault.owner();

    match args.command {
        ConversationsCommand::List {
            folder,
            tag,
            platform,
            model,
            search,
            page,
            per_page,
        } => {
            let filter = ConversationFilter {
                folder_id: folder,
                tag_id: tag,
                platform,
                model,
                search,
            };
            let listing = vault
                .history()
                .list_conversations(owner, &filter, Page { page, per_page })
                .await?;
            if out.is_json() {
                return render::print_json(&listing);
            }

            if listing.items.is_empty() {
                println!("No conversations found");
                return Ok(());
            }
            for conversation in &listing.items {
                render::render_conversation_row(conversation);
            }
            println!(
                "\n{}",
                style(format!(
                    "page {} of {} ({} conversations)",
                    listing.page,
                    listing.pages.max(1),
                    listing.total
                ))
                .dim()
            );
        }

        ConversationsCommand::Show { id } => {
            let (conversation, messages) =
                vault.history().conversation_with_messages(owner, id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({
                    "conversation": conversation,
                    "messages": messages,
                }));
            }
            render::render_transcript(&conversation, &messages);
        }

        ConversationsCommand::Rename { id, title } => {
            let update = ConversationUpdate {
                title: Some(title),
                ..Default::default()
            };
            let conversation = vault.history().update_conversation(owner, id, update).await?;
            finish(out, &conversation, &format!("Renamed conversation {}", id))?;
        }

        ConversationsCommand::Move { id, folder } => {
            let update = ConversationUpdate {
                folder_id: Some(folder),
                ..Default::default()
            };
            let conversation = vault.history().update_conversation(owner, id, update).await?;
            let message = match folder {
                Some(folder) => format!("Moved conversation {} to folder {}", id, folder),
                None => format!("Moved conversation {} out of its folder", id),
            };
            finish(out, &conversation, &message)?;
        }

        ConversationsCommand::Tag { id, tags } => {
            let update = ConversationUpdate {
                tag_ids: Some(tags),
                ..Default::default()
            };
            let conversation = vault.history().update_conversation(owner, id, update).await?;
            let message = format!(
                "Conversation {} now has {} tag(s)",
                id,
                conversation.tag_ids.len()
            );
            finish(out, &conversation, &message)?;
        }

        ConversationsCommand::Delete { id } => {
            vault.delete_conversation(id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "deleted": id }));
            }
            render::render_success(&format!("Deleted conversation {}", id));
        }
    }

    Ok(())
}

fn finish<T: serde::Serialize>(out: Output, value: &T, message: &str) -> anyhow::Result<()> {
    if out.is_json() {
        render::print_json(value)
    } else {
        render::render_success(message);
        Ok(())
    }
}
