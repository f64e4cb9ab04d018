//! ChatVault command-line interface.

pub mod commands;
pub mod render;

use anyhow::Context;
use chatvault_core::config::Config;
use chatvault_core::error::ConfigError;
use chatvault_core::paths;
use chatvault_service::ChatVault;
use clap::{Parser, Subcommand};
use render::Output;
use std::path::PathBuf;

/// ChatVault - personal AI chat history
#[derive(Parser)]
#[command(name = "chatvault")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "CHATVAULT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Talk to a chat provider
    Chat(commands::chat::ChatArgs),

    /// Browse and organize conversations
    Conversations(commands::conversations::ConversationsArgs),

    /// Manage folders
    Folders(commands::folders::FoldersArgs),

    /// Manage tags
    Tags(commands::tags::TagsArgs),

    /// Manage provider API keys
    Keys(commands::keys::KeysArgs),

    /// Search message history
    Search(commands::search::SearchArgs),

    /// Show usage statistics
    Stats,

    /// Export transcripts
    Export(commands::export::ExportArgs),

    /// Import a JSON transcript
    Import(commands::import::ImportArgs),

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Run diagnostics
    Doctor(commands::doctor::DoctorArgs),

    /// Show version information
    Version,
}

/// Resolve the config file path: `--config`, then `CHATVAULT_CONFIG`, then the default.
pub fn config_path(explicit: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.clone()),
        None => Ok(paths::config_file()?),
    }
}

/// Load the configuration, seeding one from the environment when no file exists.
pub fn load_config(explicit: Option<&PathBuf>) -> anyhow::Result<Config> {
    let path = config_path(explicit)?;
    match Config::load(&path) {
        Ok(config) => Ok(config),
        Err(ConfigError::NotFound(_)) => Ok(Config::from_env_defaults()),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    let out = Output::from_flag(cli.json);

    match cli.command {
        Commands::Config(args) => {
            let path = config_path(cli.config.as_ref())?;
            commands::config::run(args, &path, config).await
        }
        Commands::Doctor(args) => commands::doctor::run(args, config).await,
        Commands::Version => {
            println!("chatvault {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        command => {
            let vault = ChatVault::open(&config)
                .await
                .context("Failed to open chat history")?;
            tracing::debug!(
                owner = %vault.owner(),
                backend = ?vault.search_status().backend,
                "Vault ready"
            );
            dispatch(command, &vault, out).await
        }
    }
}

async fn dispatch(command: Commands, vault: &ChatVault, out: Output) -> anyhow::Result<()> {
    match command {
        Commands::Chat(args) => commands::chat::run(args, vault, out).await,
        Commands::Conversations(args) => commands::conversations::run(args, vault, out).await,
        Commands::Folders(args) => commands::folders::run(args, vault, out).await,
        Commands::Tags(args) => commands::tags::run(args, vault, out).await,
        Commands::Keys(args) => commands::keys::run(args, vault, out).await,
        Commands::Search(args) => commands::search::run(args, vault, out).await,
        Commands::Stats => commands::stats::run(vault, out).await,
        Commands::Export(args) => commands::export::run(args, vault).await,
        Commands::Import(args) => commands::import::run(args, vault, out).await,
        Commands::Config(_) | Commands::Doctor(_) | Commands::Version => Ok(()),
    }
}
