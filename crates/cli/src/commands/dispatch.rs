//! Dispatch command - one announcement cycle

use anyhow::{Result, bail};
use coupon_herald_adapters::delivery::StubDelivery;
use coupon_herald_domain::{
    CycleOutcome, CycleReport, DeliveryPort, SkipReason, SystemClock,
    usecases::{DispatchConfig, DispatchCycle},
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::DispatchArgs;
use crate::config::{AppConfig, StateBackend};
use crate::wiring;

pub async fn execute(args: DispatchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let mut dry_run = args.dry_run || config.general.dry_run;
    if args.outbox.is_some() && dry_run {
        tracing::info!("--outbox overrides dry-run");
        dry_run = false;
    }

    let destination = wiring::resolve_destination(&config)?;
    let render_config = config.render.to_render_config()?;

    tracing::info!(
        dry_run = dry_run,
        outbox = ?args.outbox,
        destination = ?destination,
        catalog = %config.catalog.path.display(),
        scheme = ?config.state.scheme,
        "Starting dispatch cycle"
    );

    if config.state.backend == StateBackend::Memory && !dry_run {
        bail!("state.backend = \"memory\" does not persist the cursor; use it only with --dry-run");
    }

    let catalog = wiring::build_catalog(&config);
    let cursor_store = wiring::build_cursor_store(&config, destination.as_deref()).await?;

    // The cycle skips before delivering when there is no destination
    let delivery: Arc<dyn DeliveryPort> = if destination.is_some() {
        wiring::build_delivery(&config, args.outbox.as_deref(), dry_run).await?
    } else {
        Arc::new(StubDelivery::new())
    };

    let cycle = DispatchCycle::new(
        catalog,
        cursor_store,
        delivery,
        Arc::new(SystemClock),
        DispatchConfig {
            destination,
            dry_run,
            render_config,
        },
    );

    let report = cycle.run_once().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &CycleReport) {
    match &report.outcome {
        CycleOutcome::Sent {
            position,
            title,
            receipt,
            cursor,
            ..
        } => {
            println!("✓ Sent item {}: {}", position, title);
            match &receipt.url {
                Some(url) => println!("  Message: {} ({})", receipt.message_id, url),
                None => println!("  Message: {}", receipt.message_id),
            }
            println!("  Cursor: {}", cursor);
        }
        CycleOutcome::Skipped {
            reason: SkipReason::DryRun { position, text },
        } => {
            println!("[DRY RUN] Item {} would be announced:", position);
            println!();
            println!("{}", text);
        }
        CycleOutcome::Skipped { reason } => {
            println!("- Skipped: {}", reason);
        }
        CycleOutcome::Failed { stage, error } => {
            println!("✗ Failed at {:?} stage: {}", stage, error);
            println!("  Cursor not advanced; the same item is retried next run");
        }
    }
}
