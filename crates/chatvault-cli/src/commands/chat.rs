//! Chat commands.

use super::parse_platform;
use crate::render::{self, Output};
use chatvault_core::{ConversationId, FolderId, Platform};
use chatvault_service::{ChatVault, SendRequest};
use clap::Args;
use console::style;

/// Chat command arguments.
#[derive(Args)]
pub struct ChatArgs {
    #[command(subcommand)]
    pub command: ChatCommand,
}

#[derive(clap::Subcommand)]
pub enum ChatCommand {
    /// Send a message and store the reply
    Send {
        /// Message text
        message: String,

        /// Platform (openai, anthropic, google)
        #[arg(short, long, value_parser = parse_platform)]
        platform: Platform,

        /// Model id
        #[arg(short, long)]
        model: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<ConversationId>,

        /// Folder for a new conversation
        #[arg(long)]
        folder: Option<FolderId>,
    },

    /// List the models offered for a platform
    Models {
        /// Platform (openai, anthropic, google)
        #[arg(value_parser = parse_platform)]
        platform: Platform,
    },
}

/// Run the chat command.
pub async fn run(args: ChatArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    match args.command {
        ChatCommand::Send {
            message,
            platform,
            model,
            conversation,
            folder,
        } => {
            let mut request = SendRequest::new(platform, model, message);
            if let Some(id) = conversation {
                request = request.in_conversation(id);
            }
            if let Some(id) = folder {
                request = request.in_folder(id);
            }

            let outcome = vault.send(request).await?;
            if out.is_json() {
                return render::print_json(&outcome);
            }

            render::render_message(&outcome.assistant_message);
            println!();
            println!(
                "{}",
                style(format!(
                    "conversation {}  {} tokens  {}",
                    outcome.conversation.id,
                    outcome.assistant_message.tokens.unwrap_or(0),
                    render::format_cost(outcome.assistant_message.cost.unwrap_or(0.0)),
                ))
                .dim()
            );
        }

        ChatCommand::Models { platform } => {
            let models = vault.models(platform).await?;
            if out.is_json() {
                return render::print_json(&models);
            }
            println!("{}", style(platform.display_name()).bold());
            for model in models {
                println!("  {}", model);
            }
        }
    }

    Ok(())
}
