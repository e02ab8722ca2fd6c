//! `config init`: scaffold a config file and show where it points

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::{AppConfig, StateBackend};

pub async fn execute(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => {
            let config = write_example(&path, force).await?;
            print_summary(&path, &config);
            Ok(())
        }
    }
}

/// Write the example config to `path` and load it back through the normal
/// config pipeline, so a file that would fail at dispatch time fails here.
async fn write_example(path: &Path, force: bool) -> Result<AppConfig> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    tokio::fs::write(path, AppConfig::example_toml())
        .await
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    let config = AppConfig::load(Some(path))
        .with_context(|| format!("Written config does not load: {}", path.display()))?;
    config.render.to_render_config()?;
    Ok(config)
}

fn print_summary(path: &Path, config: &AppConfig) {
    let cursor_location: PathBuf = match config.state.backend {
        StateBackend::Sqlite => config.state.db_path.clone(),
        _ => config.state.cursor_path.clone(),
    };

    println!("Created config file: {}", path.display());
    println!("  catalog:      {}", config.catalog.path.display());
    println!("  cursor:       {}", cursor_location.display());
    println!(
        "  channel:      {}",
        config
            .destination
            .channel
            .clone()
            .unwrap_or_else(|| config.destination.channel_file.display().to_string())
    );
    println!("  bot token:    ${}", config.telegram.bot_token_env);
    println!();
    println!("Run 'coupon-herald doctor' to check the setup, then");
    println!("'coupon-herald dispatch --dry-run' to see the next announcement.");
}
