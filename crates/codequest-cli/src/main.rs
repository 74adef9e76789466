//! `codequest`: a terminal tutorial for SQL, Linux, CSS and Docker.
//!
//! # Startup Sequence
//!
//! 1. Parse flags
//! 2. Load configuration from `codequest.yaml`
//! 3. Initialize structured logging on stderr
//! 4. Load the level catalog
//! 5. Open the progress store
//! 6. Run the interactive shell on stdin/stdout

mod error;
mod render;
mod shell;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use codequest_catalog::Catalog;
use codequest_engine::AppConfig;
use codequest_engine::config::LoggingConfig;
use codequest_progress::{JsonFileStore, MemoryStore, ProgressStore};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;
use crate::shell::Shell;

#[derive(Debug, Parser)]
#[command(name = "codequest")]
#[command(about = "Learn SQL, Linux, CSS and Docker one level at a time")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep progress in memory only; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())
        .map_err(CliError::from)
        .context("loading configuration")?;
    init_logging(&config.logging);
    info!(
        progress_path = %config.storage.progress_path.display(),
        ephemeral = cli.ephemeral,
        celebration_delay_ms = config.session.celebration_delay_ms,
        "configuration loaded"
    );

    let catalog = load_catalog(&config).context("loading level catalog")?;

    let store: Box<dyn ProgressStore> = if cli.ephemeral {
        Box::new(MemoryStore::new())
    } else {
        Box::new(JsonFileStore::new(&config.storage.progress_path))
    };

    let mut shell = Shell::new(config, catalog, store);
    shell
        .run(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
        .context("running the terminal shell")?;
    Ok(())
}

/// `RUST_LOG` when set, else the configured level. Logs go to stderr so
/// they never mix with the game on stdout.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(config: &AppConfig) -> Result<Catalog, CliError> {
    let catalog = match &config.catalog.dir {
        Some(dir) => Catalog::from_dir(dir)?,
        None => Catalog::builtin()?,
    };
    Ok(catalog)
}
