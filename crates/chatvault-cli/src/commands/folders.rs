//! Folder management commands.

use crate::render::{self, Output};
use chatvault_core::FolderId;
use chatvault_history::FolderUpdate;
use chatvault_service::ChatVault;
use clap::Args;
use console::style;

/// Folders command arguments.
#[derive(Args)]
pub struct FoldersArgs {
    #[command(subcommand)]
    pub command: FoldersCommand,
}

#[derive(clap::Subcommand)]
pub enum FoldersCommand {
    /// List folders
    List,

    /// Create a folder
    Create {
        name: String,

        /// Parent folder
        #[arg(long)]
        parent: Option<FolderId>,

        /// Display colour, e.g. "#667eea"
        #[arg(long)]
        color: Option<String>,
    },

    /// Rename, recolour or re-parent a folder
    Update {
        id: FolderId,

        #[arg(long)]
        name: Option<String>,

        /// New parent folder
        #[arg(long, conflicts_with = "top_level")]
        parent: Option<FolderId>,

        /// Move the folder to the top level
        #[arg(long)]
        top_level: bool,

        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a folder and its sub-folders
    Delete {
        id: FolderId,
    },
}

/// Run the folders command.
pub async fn run(args: FoldersArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let owner = vault.owner();
    let history = vault.history();

    match args.command {
        FoldersCommand::List => {
            let folders = history.list_folders(owner).await?;
            if out.is_json() {
                return render::print_json(&folders);
            }
            if folders.is_empty() {
                println!("No folders");
            }
            for folder in folders {
                let parent = folder
                    .parent_id
                    .map(|p| format!("  in {}", p))
                    .unwrap_or_default();
                println!(
                    "{:>5}  {}  {}{}",
                    style(folder.id).bold(),
                    style(&folder.name).cyan(),
                    style(&folder.color).dim(),
                    style(parent).dim(),
                );
            }
        }

        FoldersCommand::Create {
            name,
            parent,
            color,
        } => {
            let folder = history.create_folder(owner, &name, parent, color).await?;
            if out.is_json() {
                return render::print_json(&folder);
            }
            render::render_success(&format!("Created folder {} ({})", folder.name, folder.id));
        }

        FoldersCommand::Update {
            id,
            name,
            parent,
            top_level,
            color,
        } => {
            let parent_id = if top_level { Some(None) } else { parent.map(Some) };
            let update = FolderUpdate {
                name,
                parent_id,
                color,
            };
            let folder = history.update_folder(owner, id, update).await?;
            if out.is_json() {
                return render::print_json(&folder);
            }
            render::render_success(&format!("Updated folder {}", folder.id));
        }

        FoldersCommand::Delete { id } => {
            let removed = history.delete_folder(owner, id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "deleted": removed }));
            }
            render::render_success(&format!("Deleted {} folder(s)", removed));
        }
    }

    Ok(())
}
