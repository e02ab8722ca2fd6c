//! Configuration loading and management

use anyhow::{Context, Result, bail};
use coupon_herald_domain::{CursorScheme, usecases::RenderConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub destination: DestinationConfig,

    #[serde(default)]
    pub delivery: DeliveryConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub render: RenderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub backend: StateBackend,

    #[serde(default)]
    pub scheme: CursorScheme,

    #[serde(default = "default_cursor_path")]
    pub cursor_path: PathBuf,

    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Channel handle (`@name`) or numeric chat id; overrides `channel_file`
    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default = "default_channel_file")]
    pub channel_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// `telegram` or `stub`
    #[serde(default = "default_delivery_adapter")]
    pub adapter: String,

    /// Scripted failure for the stub adapter (api, auth, rate_limited, network, unconfirmed)
    #[serde(default)]
    pub stub_failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    #[serde(default = "default_telegram_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub disable_notification: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_caption_limit")]
    pub caption_limit: usize,

    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_header")]
    pub header: String,

    #[serde(default = "default_call_to_action")]
    pub call_to_action: String,

    #[serde(default = "default_button_text")]
    pub button_text: String,

    #[serde(default = "default_free_label")]
    pub free_label: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("website/coupons.json")
}

fn default_cursor_path() -> PathBuf {
    PathBuf::from("scraper/last_sent.txt")
}

fn default_db_path() -> PathBuf {
    PathBuf::from("scraper/state.sqlite")
}

fn default_channel_file() -> PathBuf {
    PathBuf::from("scraper/channel_id.txt")
}

fn default_delivery_adapter() -> String {
    "telegram".to_string()
}

fn default_bot_token_env() -> String {
    "BOT_TOKEN".to_string()
}

fn default_telegram_base_url() -> String {
    coupon_herald_adapters::telegram::DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_caption_limit() -> usize {
    RenderConfig::default().caption_limit
}

fn default_description_limit() -> usize {
    RenderConfig::default().description_limit
}

fn default_currency_symbol() -> String {
    RenderConfig::default().currency_symbol
}

fn default_header() -> String {
    RenderConfig::default().header
}

fn default_call_to_action() -> String {
    RenderConfig::default().call_to_action
}

fn default_button_text() -> String {
    RenderConfig::default().button_text
}

fn default_free_label() -> String {
    RenderConfig::default().free_label
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            backend: StateBackend::default(),
            scheme: CursorScheme::default(),
            cursor_path: default_cursor_path(),
            db_path: default_db_path(),
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            channel: None,
            channel_file: default_channel_file(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            adapter: default_delivery_adapter(),
            stub_failure: None,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            base_url: default_telegram_base_url(),
            timeout_secs: default_timeout(),
            disable_notification: false,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        let defaults = RenderConfig::default();
        Self {
            caption_limit: defaults.caption_limit,
            description_limit: defaults.description_limit,
            currency_symbol: defaults.currency_symbol,
            header: defaults.header,
            call_to_action: defaults.call_to_action,
            button_text: defaults.button_text,
            free_label: defaults.free_label,
        }
    }
}

impl RenderSettings {
    pub fn to_render_config(&self) -> Result<RenderConfig> {
        if self.caption_limit == 0 {
            bail!("render.caption_limit must be greater than zero");
        }

        Ok(RenderConfig {
            caption_limit: self.caption_limit,
            description_limit: self.description_limit,
            currency_symbol: self.currency_symbol.clone(),
            header: self.header.clone(),
            call_to_action: self.call_to_action.clone(),
            button_text: self.button_text.clone(),
            free_label: self.free_label.clone(),
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("COUPON_HERALD")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# coupon-herald configuration
# Every key may be overridden from the environment, e.g.
#   COUPON_HERALD__DESTINATION__CHANNEL=@my_channel

[general]
log_level = "info"
# Render and log the next announcement without sending it
dry_run = false

[catalog]
# JSON array written by the crawler, in discovery order
path = "website/coupons.json"

[state]
backend = "file"        # file, sqlite, memory
scheme = "position"     # position, head_watch
cursor_path = "scraper/last_sent.txt"
db_path = "scraper/state.sqlite"

[destination]
# channel = "@my_channel"
channel_file = "scraper/channel_id.txt"

[delivery]
adapter = "telegram"    # telegram, stub
# stub_failure = "api"  # api, auth, rate_limited, network, unconfirmed

[telegram]
# Name of the env var holding the bot token; the token itself never goes here
bot_token_env = "BOT_TOKEN"
base_url = "https://api.telegram.org"
timeout_secs = 30
disable_notification = false

[render]
caption_limit = 1024
description_limit = 200
currency_symbol = "$"
header = "🎓 New Course Deal"
call_to_action = "👉 Enroll before the coupon expires!"
button_text = "Enroll Now"
free_label = "FREE"
"#
        .to_string()
    }
}
