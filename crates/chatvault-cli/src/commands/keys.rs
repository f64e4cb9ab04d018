//! Provider API key commands.

use super::parse_platform;
use crate::render::{self, Output};
use chatvault_core::{ApiKeyId, Platform, SecretString};
use chatvault_service::ChatVault;
use clap::Args;
use console::style;

/// Keys command arguments.
#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub command: KeysCommand,
}

#[derive(clap::Subcommand)]
pub enum KeysCommand {
    /// List stored keys (masked)
    List,

    /// Store the key for a platform, replacing any existing one
    Set {
        #[arg(value_parser = parse_platform)]
        platform: Platform,

        /// Key value (prompted if not provided)
        key: Option<String>,
    },

    /// Delete a stored key
    Delete {
        id: ApiKeyId,
    },

    /// Enable or disable a stored key
    Toggle {
        id: ApiKeyId,
    },
}

/// Run the keys command.
pub async fn run(args: KeysArgs, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    let owner = vault.owner();
    let history = vault.history();

    match args.command {
        KeysCommand::List => {
            let keys = history.list_api_keys(owner).await?;
            if out.is_json() {
                return render::print_json(&keys);
            }
            if keys.is_empty() {
                println!("No API keys stored");
                println!("  Run 'chatvault keys set <platform>' to add one");
            }
            for key in keys {
                let state = if key.is_active {
                    style("active").green()
                } else {
                    style("inactive").yellow()
                };
                println!(
                    "{:>5}  {:<10}  {}  {}",
                    style(key.id).bold(),
                    key.platform.display_name(),
                    key.masked_key,
                    state,
                );
            }
        }

        KeysCommand::Set { platform, key } => {
            let value = match key {
                Some(v) => v,
                None => {
                    let prompt = format!("Enter {} API key: ", platform.display_name());
                    rpassword::prompt_password(prompt)
                        .map_err(|e| anyhow::anyhow!("Failed to read key: {}", e))?
                }
            };

            let summary = history
                .upsert_api_key(owner, platform, SecretString::new(value))
                .await?;
            if out.is_json() {
                return render::print_json(&summary);
            }
            render::render_success(&format!(
                "Stored {} key {}",
                platform.display_name(),
                summary.masked_key
            ));
        }

        KeysCommand::Delete { id } => {
            history.delete_api_key(owner, id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "deleted": id }));
            }
            render::render_success(&format!("Deleted key {}", id));
        }

        KeysCommand::Toggle { id } => {
            let active = history.toggle_api_key(owner, id).await?;
            if out.is_json() {
                return render::print_json(&serde_json::json!({ "id": id, "is_active": active }));
            }
            let state = if active { "enabled" } else { "disabled" };
            render::render_success(&format!("Key {} {}", id, state));
        }
    }

    Ok(())
}
