//! ChatVault CLI entry point.

use chatvault_cli::{load_config, run, Cli};
use chatvault_core::config::LoggingConfig;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing or unreadable .env is not an error
    let _ = chatvault_core::env::load_dotenv();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    init_logging(&config.logging, cli.verbose);

    run(cli, config).await
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig, verbose: u8) {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chatvault={}", level)));

    let json = logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();
}
