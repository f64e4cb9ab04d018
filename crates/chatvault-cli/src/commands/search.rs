//! Search commands.

use crate::render::{self, Output};
use chatvault_service::ChatVault;
use clap::Args;
use console::style;

/// Search command arguments.
#[derive(Args)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub command: SearchCommand,
}

#[derive(clap::Subcommand)]
pub enum SearchCommand {
    /// Rank messages by meaning
    Semantic {
        query: String,

        /// Maximum results (defaults to search.default_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Match messages containing the query text
    Text {
        query: String,

        /// Maximum results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Re-embed every stored message
    Reindex,
}

/// Run the search command.
pub async fn run(args: SearchArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let hits = match args.command {
        SearchCommand::Semantic { query, limit } => {
            let status = vault.search_status();
            if !status.available && status.error.is_none() && !out.is_json() {
                println!(
                    "{}",
                    style("Semantic search is unavailable; see 'chatvault doctor'").yellow()
                );
            }
            vault.semantic_search(&query, limit).await?
        }
        SearchCommand::Text { query, limit } => vault.text_search(&query, limit).await?,
        SearchCommand::Reindex => {
            let indexed = vault.reindex().await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "indexed": indexed }));
            }
            render::render_success(&format!("Indexed {} message(s)", indexed));
            return Ok(());
        }
    };

    if out.is_json() {
        return render::print_json(&hits);
    }
    if hits.is_empty() {
        println!("No matches");
    }
    for hit in &hits {
        render::render_hit(hit);
    }

    Ok(())
}
