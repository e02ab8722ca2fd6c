//! Adapter construction shared by the commands

use anyhow::{Context, Result, bail};
use coupon_herald_adapters::{
    catalog::JsonCatalogSource,
    delivery::{StubDelivery, StubFailure},
    destination,
    outbox::{OutboxDelivery, OutboxWriter},
    state::{FileCursorStore, InMemoryCursorStore, SqliteCursorStore},
    telegram::TelegramDelivery,
};
use coupon_herald_domain::{CatalogItem, CatalogSource, Cursor, CursorStore, DeliveryPort};
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AppConfig, StateBackend};

/// Row key used by the SQLite backend when no destination is known
const UNSET_DESTINATION_KEY: &str = "default";

pub fn build_catalog(config: &AppConfig) -> Arc<JsonCatalogSource> {
    Arc::new(JsonCatalogSource::new(&config.catalog.path))
}

pub async fn load_catalog(config: &AppConfig) -> Result<Vec<CatalogItem>> {
    build_catalog(config)
        .load_catalog()
        .await
        .with_context(|| format!("Failed to load catalog: {}", config.catalog.path.display()))
}

pub fn resolve_destination(config: &AppConfig) -> Result<Option<String>> {
    destination::resolve_destination(
        config.destination.channel.as_deref(),
        &config.destination.channel_file,
    )
    .with_context(|| {
        format!(
            "Failed to read channel file: {}",
            config.destination.channel_file.display()
        )
    })
}

pub async fn build_cursor_store(
    config: &AppConfig,
    destination: Option<&str>,
) -> Result<Arc<dyn CursorStore>> {
    let scheme = config.state.scheme;
    let store: Arc<dyn CursorStore> = match config.state.backend {
        StateBackend::File => Arc::new(FileCursorStore::new(&config.state.cursor_path, scheme)),
        StateBackend::Sqlite => Arc::new(
            SqliteCursorStore::new(
                &config.state.db_path,
                destination.unwrap_or(UNSET_DESTINATION_KEY),
                scheme,
            )
            .await
            .context("Failed to initialize SQLite cursor store")?,
        ),
        StateBackend::Memory => Arc::new(InMemoryCursorStore::new(scheme)),
    };
    Ok(store)
}

/// Read the cursor without creating any state on disk
pub async fn peek_cursor(config: &AppConfig, destination: Option<&str>) -> Result<Cursor> {
    if config.state.backend == StateBackend::Sqlite && !config.state.db_path.exists() {
        return Ok(config.state.scheme.zero());
    }

    let store = build_cursor_store(config, destination).await?;
    store.load_cursor().await.context("Failed to load cursor")
}

/// Pick the delivery adapter: outbox, then dry run, then the configured adapter
pub async fn build_delivery(
    config: &AppConfig,
    outbox: Option<&Path>,
    dry_run: bool,
) -> Result<Arc<dyn DeliveryPort>> {
    if let Some(path) = outbox {
        let writer = OutboxWriter::open(path)
            .await
            .with_context(|| format!("Failed to open outbox: {}", path.display()))?;
        tracing::info!(outbox = %path.display(), "Writing announcements to outbox");
        return Ok(Arc::new(OutboxDelivery::new(writer)));
    }

    // Never called in a dry run
    if dry_run {
        return Ok(Arc::new(StubDelivery::new()));
    }

    match config.delivery.adapter.trim() {
        "telegram" => {
            let token = load_secret(&config.telegram.bot_token_env, "telegram")?;
            let delivery = TelegramDelivery::with_base_url(
                token,
                config.telegram.base_url.clone(),
                Duration::from_secs(config.telegram.timeout_secs),
            )
            .context("Failed to build Telegram client")?
            .silent(config.telegram.disable_notification);
            Ok(Arc::new(delivery))
        }
        "stub" => {
            let stub = match config.delivery.stub_failure.as_deref() {
                Some(failure) => {
                    let failure: StubFailure = failure.parse().map_err(anyhow::Error::msg)?;
                    StubDelivery::failing(failure)
                }
                None => StubDelivery::new(),
            };
            Ok(Arc::new(stub))
        }
        other => bail!("Unknown delivery adapter: {}", other),
    }
}

pub(crate) fn load_secret(env_var: &str, what: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No token env var configured for {}", what);
    }

    let value = std::env::var(env_var)
        .with_context(|| format!("Missing token env var {} for {}", env_var, what))?;

    if value.trim().is_empty() {
        bail!("Token env var {} is empty for {}", env_var, what);
    }

    Ok(SecretString::new(value.trim().into()))
}
