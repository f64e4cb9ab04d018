//! Tag management commands.

use crate::render::{self, Output};
use chatvault_core::TagId;
use chatvault_history::TagUpdate;
use chatvault_service::ChatVault;
use clap::Args;
use console::style;

/// Tags command arguments.
#[derive(Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

#[derive(clap::Subcommand)]
pub enum TagsCommand {
    /// List tags
    List,

    /// Create a tag, or show the existing one with that name
    Create {
        name: String,

        #[arg(long)]
        color: Option<String>,
    },

    /// Rename or recolour a tag
    Update {
        id: TagId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a tag and detach it from conversations
    Delete {
        id: TagId,
    },
}

/// Run the tags command.
pub async fn run(args: TagsArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let owner = vault.owner();
    let history = vault.history();

    match args.command {
        TagsCommand::List => {
            let tags = history.list_tags(owner).await?;
            if out.is_json() {
                return render::print_json(&tags);
            }
            if tags.is_empty() {
                println!("No tags");
            }
            for tag in tags {
                println!(
                    "{:>5}  {}  {}",
                    style(tag.id).bold(),
                    style(&tag.name).cyan(),
                    style(&tag.color).dim(),
                );
            }
        }

        TagsCommand::Create { name, color } => {
            let tag = history.create_tag(owner, &name, color).await?;
            if out.is_json() {
                return render::print_json(&tag);
            }
            render::render_success(&format!("Tag {} ({})", tag.name, tag.id));
        }

        TagsCommand::Update { id, name, color } => {
            let tag = history.update_tag(owner, id, TagUpdate { name, color }).await?;
            if out.is_json() {
                return render::print_json(&tag);
            }
            render::render_success(&format!("Updated tag {}", tag.id));
        }

        TagsCommand::Delete { id } => {
            history.delete_tag(owner, id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "deleted": id }));
            }
            render::render_success(&format!("Deleted tag {}", id));
        }
    }

    Ok(())
}
