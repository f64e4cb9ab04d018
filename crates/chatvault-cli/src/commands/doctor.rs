//! Diagnostic commands.

use chatvault_core::config::{Config, VectorBackend};
use chatvault_core::env::get_var;
use chatvault_core::{paths, Platform};
use chatvault_service::ChatVault;
use clap::Args;
use console::{style, Emoji};

static CHECK: Emoji = Emoji("✓", "+");
static CROSS: Emoji = Emoji("✗", "x");
static WARN: Emoji = Emoji("⚠", "!");

/// Doctor command arguments.
#[derive(Args)]
pub struct DoctorArgs {
    /// Also list live models for platforms with a stored key
    #[arg(long)]
    pub full: bool,
}

#[derive(Default)]
struct Tally {
    errors: usize,
    warnings: usize,
}

impl Tally {
    fn ok(&self, message: impl std::fmt::Display) {
        println!("  {} {}", style(CHECK).green(), message);
    }

    fn warn(&mut self, message: impl std::fmt::Display) {
        println!("  {} {}", style(WARN).yellow(), message);
        self.warnings += 1;
    }

    fn error(&mut self, message: impl std::fmt::Display) {
        println!("  {} {}", style(CROSS).red(), message);
        self.errors += 1;
    }
}

/// Run the doctor command.
pub async fn run(args: DoctorArgs, config: Config) -> anyhow::Result<()> {
    println!("ChatVault Doctor\n");
    let mut tally = Tally::default();

    println!("Checking directories...");
    match paths::base_dir() {
        Ok(dir) if dir.exists() => tally.ok(format!("Base directory exists: {:?}", dir)),
        Ok(dir) => tally.warn(format!("Base directory missing: {:?}", dir)),
        Err(e) => tally.error(format!("Failed to determine base directory: {}", e)),
    }

    println!("\nChecking configuration...");
    match config.validate() {
        Ok(_) => tally.ok("Configuration valid"),
        Err(e) => tally.error(format!("Configuration invalid: {}", e)),
    }
    match config.storage.history_path() {
        Ok(path) if path.exists() => tally.ok(format!("History file: {:?}", path)),
        Ok(path) => tally.warn(format!("History file not created yet: {:?}", path)),
        Err(e) => tally.error(format!("Failed to resolve history path: {}", e)),
    }

    println!("\nChecking semantic search...");
    let vault = match ChatVault::open(&config).await {
        Ok(vault) => Some(vault),
        Err(e) => {
            tally.error(format!("Failed to open history: {}", e));
            None
        }
    };
    if let Some(vault) = &vault {
        let status = vault.search_status();
        if let Some(error) = &status.error {
            tally.error(format!("Semantic search refused: {}", error));
        }
        match (status.model, status.backend) {
            (Some(_), None) if status.error.is_some() => {}
            (Some(model), Some(backend)) => {
                tally.ok(format!("Embedding model: {}", model));
                if backend == config.search.backend.as_str() {
                    tally.ok(format!("Vector backend: {}", backend));
                } else {
                    tally.warn(format!(
                        "Vector backend '{}' unreachable, using {}",
                        config.search.backend.as_str(),
                        backend
                    ));
                }
            }
            _ => tally.warn(format!(
                "Embedding model '{}' unavailable, semantic search disabled",
                config.search.embedding_model
            )),
        }
        if config.search.backend == VectorBackend::InProcess {
            println!("    {}", style("In-process search scans every message per query").dim());
        }
    }

    println!("\nChecking API keys...");
    if let Some(vault) = &vault {
        for platform in [Platform::OpenAI, Platform::Anthropic, Platform::Google] {
            match vault.history().active_api_key(vault.owner(), platform).await {
                Ok(Some(_)) => tally.ok(format!("{} key stored", platform.display_name())),
                Ok(None) => tally.warn(format!("{} key not stored", platform.display_name())),
                Err(e) => tally.error(format!("Failed to read keys: {}", e)),
            }
        }
    }
    if get_var("OPENAI_API_KEY").is_some() {
        tally.ok("OPENAI_API_KEY is set (used for OpenAI embeddings)");
    }

    if args.full {
        if let Some(vault) = &vault {
            println!("\nChecking models...");
            for platform in vault.providers().platforms() {
                match vault.models(platform).await {
                    Ok(models) => tally.ok(format!(
                        "{}: {}",
                        platform.display_name(),
                        models.join(", ")
                    )),
                    Err(e) => tally.error(format!("{}: {}", platform.display_name(), e)),
                }
            }
        }
    }

    println!("\n{}", style("Summary").bold());
    let errors = tally.errors;
    let warnings = tally.warnings;
    println!("  Errors: {}", if errors > 0 { style(errors).red() } else { style(errors).green() });
    println!("  Warnings: {}", if warnings > 0 { style(warnings).yellow() } else { style(warnings).green() });

    if errors > 0 {
        anyhow::bail!("{} error(s) found", errors);
    }

    Ok(())
}
