//! Transcript export commands.

use anyhow::Context;
use chatvault_core::ConversationId;
use chatvault_history::{Export, ExportFormat};
use chatvault_service::ChatVault;
use clap::Args;
use std::path::{Path, PathBuf};

/// Export command arguments.
#[derive(Args)]
pub struct ExportArgs {
    #[command(subcommand)]
    pub command: ExportCommand,
}

#[derive(clap::Subcommand)]
pub enum ExportCommand {
    /// Export one conversation as json, csv or markdown
    Conversation {
        id: ConversationId,

        #[arg(short, long, default_value = "json")]
        format: String,

        /// File or directory to write to; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export several conversations as json or markdown
    Bulk {
        #[arg(required = true)]
        ids: Vec<ConversationId>,

        #[arg(short, long, default_value = "json")]
        format: String,

        /// File or directory to write to; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run the export command.
pub async fn run(args: ExportArgs, vault: &ChatVault) -> anyhow::Result<()> {
    let owner = vault.owner();

    let (export, output) = match args.command {
        ExportCommand::Conversation { id, format, output } => {
            let format: ExportFormat = format.parse()?;
            (vault.history().export_conversation(owner, id, format).await?, output)
        }
        ExportCommand::Bulk { ids, format, output } => {
            let format: ExportFormat = format.parse()?;
            (vault.history().export_bulk(owner, &ids, format).await?, output)
        }
    };

    match output {
        Some(target) => {
            let path = write_export(&export, &target)?;
            eprintln!("Wrote {} ({})", path.display(), export.content_type);
        }
        None => print!("{}", export.body),
    }

    Ok(())
}

/// Write an export to `target`. A directory target receives the suggested file name.
pub fn write_export(export: &Export, target: &Path) -> anyhow::Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(&export.filename)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, &export.body)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
