//! Status command - where the cursor stands against the catalog

use anyhow::Result;
use coupon_herald_domain::usecases::{Selection, pending, select_next};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::StatusArgs;
use crate::config::AppConfig;
use crate::wiring;

#[derive(Debug, Serialize)]
struct StatusReport {
    destination: Option<String>,
    scheme: coupon_herald_domain::CursorScheme,
    cursor: String,
    catalog_items: usize,
    pending: usize,
    next: Option<NextItem>,
}

#[derive(Debug, Serialize)]
struct NextItem {
    position: usize,
    title: String,
}

pub async fn execute(args: StatusArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let destination = wiring::resolve_destination(&config)?;
    let catalog = wiring::load_catalog(&config).await?;
    let cursor = wiring::peek_cursor(&config, destination.as_deref()).await?;

    let next = match select_next(&catalog, &cursor) {
        Selection::Candidate { position, item } => Some(NextItem {
            position,
            title: item.label().to_string(),
        }),
        _ => None,
    };

    let report = StatusReport {
        destination,
        scheme: config.state.scheme,
        cursor: cursor.to_string(),
        catalog_items: catalog.len(),
        pending: pending(&catalog, &cursor),
        next,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("coupon-herald status");
    println!("====================");
    println!(
        "Destination: {}",
        report.destination.as_deref().unwrap_or("(not set)")
    );
    println!("Cursor:      {} ({:?})", report.cursor, report.scheme);
    println!("Catalog:     {} items", report.catalog_items);
    println!("Pending:     {}", report.pending);
    if let Some(next) = &report.next {
        println!("Next:        #{} {}", next.position, next.title);
    }

    Ok(())
}
