//! Doctor command - validate configuration and show status

use anyhow::Result;
use coupon_herald_domain::usecases::pending;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::{AppConfig, StateBackend};
use crate::wiring;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    catalog: CheckResult,
    cursor: CheckResult,
    destination: CheckResult,
    delivery: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        catalog: CheckResult::error("Not checked"),
        cursor: CheckResult::error("Not checked"),
        destination: CheckResult::error("Not checked"),
        delivery: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => match c.render.to_render_config() {
            Ok(_) => {
                report.config = CheckResult::ok("Configuration loaded successfully");
                Some(c)
            }
            Err(e) => {
                report.config = CheckResult::error(format!("Invalid render settings: {}", e));
                None
            }
        },
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        let (destination_check, destination) = check_destination(config);
        report.destination = destination_check;
        report.catalog = check_catalog(config).await;
        report.cursor = check_cursor(config, destination.as_deref()).await;
        report.delivery = check_delivery(config);
    }

    let checks = [
        &report.config,
        &report.catalog,
        &report.cursor,
        &report.destination,
        &report.delivery,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_catalog(config: &AppConfig) -> CheckResult {
    let path = &config.catalog.path;
    if !path.exists() {
        return CheckResult::warn(format!(
            "Catalog not found: {} (treated as empty)",
            path.display()
        ));
    }

    match wiring::load_catalog(config).await {
        Ok(items) => {
            let identified = items.iter().filter(|i| i.identity().is_some()).count();
            CheckResult::ok(format!("{} items in {}", items.len(), path.display())).with_details(
                serde_json::json!({
                    "count": items.len(),
                    "identified": identified,
                }),
            )
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_cursor(config: &AppConfig, destination: Option<&str>) -> CheckResult {
    let location = match config.state.backend {
        StateBackend::File => config.state.cursor_path.display().to_string(),
        StateBackend::Sqlite => config.state.db_path.display().to_string(),
        StateBackend::Memory => "memory".to_string(),
    };

    let cursor = match wiring::peek_cursor(config, destination).await {
        Ok(cursor) => cursor,
        Err(e) => return CheckResult::error(format!("{:#}", e)),
    };

    let message = format!(
        "Cursor {} ({:?}, {:?} at {})",
        cursor, config.state.scheme, config.state.backend, location
    );

    let check = if config.state.backend == StateBackend::Memory {
        CheckResult::warn(format!("{}; progress is not persisted", message))
    } else {
        CheckResult::ok(message)
    };

    match wiring::load_catalog(config).await {
        Ok(items) => check.with_details(serde_json::json!({
            "pending": pending(&items, &cursor),
        })),
        Err(_) => check,
    }
}

fn check_destination(config: &AppConfig) -> (CheckResult, Option<String>) {
    match wiring::resolve_destination(config) {
        Ok(Some(channel)) => (CheckResult::ok(format!("Channel: {}", channel)), Some(channel)),
        Ok(None) => (
            CheckResult::warn(format!(
                "No channel configured and {} is missing or empty; dispatch will skip",
                config.destination.channel_file.display()
            )),
            None,
        ),
        Err(e) => (CheckResult::error(format!("{:#}", e)), None),
    }
}

fn check_delivery(config: &AppConfig) -> CheckResult {
    match config.delivery.adapter.trim() {
        "telegram" => {
            let env_var = &config.telegram.bot_token_env;
            if env_var.trim().is_empty() {
                return CheckResult::error("No bot token env var configured");
            }

            match std::env::var(env_var) {
                Ok(val) if !val.trim().is_empty() => CheckResult::ok(format!(
                    "Telegram, bot token: {} (set), base_url: {}",
                    env_var, config.telegram.base_url
                )),
                _ if config.general.dry_run => CheckResult::warn(format!(
                    "Telegram, bot token: {} (not set), dry run enabled",
                    env_var
                )),
                _ => CheckResult::error(format!(
                    "Telegram, bot token: {} (not set)",
                    env_var
                )),
            }
        }
        "stub" => CheckResult::warn("Stub delivery: nothing is actually posted"),
        other => CheckResult::error(format!("Unknown delivery adapter: {}", other)),
    }
}

fn print_report(report: &DoctorReport) {
    println!("coupon-herald Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Catalog", &report.catalog);
    print_check("Cursor", &report.cursor);
    print_check("Destination", &report.destination);
    print_check("Delivery", &report.delivery);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall == "ok" {
        println!();
        println!("Ready to run! Try: coupon-herald dispatch --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
