//! Transcript import.

use crate::render::{self, Output};
use anyhow::Context;
use chatvault_service::ChatVault;
use clap::Args;
use std::path::PathBuf;

/// Import command arguments.
#[derive(Args)]
pub struct ImportArgs {
    /// JSON transcript: { platform, model, title?, messages: [{ role, content }] }
    pub file: PathBuf,
}

/// Run the import command.
pub async fn run(args: ImportArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let conversation = vault.import(&content).await?;
    if out.is_json() {
        return render::print_json(&conversation);
    }
    render::render_success(&format!(
        "Imported '{}' as conversation {}",
        conversation.display_title(),
        conversation.id
    ));
    Ok(())
}
