//! coupon-herald CLI entry point

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;
mod wiring;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.log_level.clone() {
        Some(level) => level,
        None => configured_log_level(&cli),
    };
    init_logging(&log_level)?;

    match cli.command {
        Commands::Dispatch(args) => commands::dispatch::execute(args, cli.config).await,
        Commands::Preview(args) => commands::preview::execute(args, cli.config).await,
        Commands::Status(args) => commands::status::execute(args, cli.config).await,
        Commands::Config(args) => commands::config::execute(args).await,
        Commands::Doctor(args) => commands::doctor::execute(args, cli.config).await,
    }
}

/// `general.log_level` from the config, when it loads; errors surface later in the command
fn configured_log_level(cli: &Cli) -> String {
    config::AppConfig::load(cli.config.as_deref())
        .map(|c| c.general.log_level)
        .unwrap_or_else(|_| "info".to_string())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}
