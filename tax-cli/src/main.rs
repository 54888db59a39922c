use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{debug, error};

use tax_cli::app::{self, App, Capabilities};
use tax_cli::{Cli, logging, output};
use tax_core::db::DbConfig;

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_default_logging();
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if cli.quiet {
        logging::set_stderr_enabled(false)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }
    debug!(app = logging::app_name(), command = ?cli.command, "Starting");

    let result = run(&cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Command failed");
    }
    logging::disable_file_logging();
    result
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    // Configuration errors are fatal before any command runs.
    let config = app::load_config(cli.config.as_deref())?;

    let capabilities = if cli.no_store {
        Capabilities::engine_only()
    } else {
        Capabilities::full()
    };
    let db_config = DbConfig::new(cli.backend.as_str(), cli.db.as_str());
    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());

    let registry = app::build_registry();
    let app = App::open(config, capabilities, &registry, &db_config, as_of).await?;

    let report = app.run(&cli.command).await?;
    let rendered = output::render(&report, cli.json).context("failed to render output")?;
    print!("{rendered}");
    Ok(())
}
