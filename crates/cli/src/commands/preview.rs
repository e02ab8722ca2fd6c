//! Preview command - render an announcement without side effects

use anyhow::{Result, bail};
use coupon_herald_domain::{
    RenderedAnnouncement,
    markup::utf16_len,
    usecases::{Renderer, Selection, select_next},
};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::PreviewArgs;
use crate::config::AppConfig;
use crate::wiring;

#[derive(Debug, Serialize)]
struct PreviewOutput<'a> {
    position: usize,
    item_id: Option<&'a str>,
    title: &'a str,
    announcement: RenderedAnnouncement,
}

pub async fn execute(args: PreviewArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let renderer = Renderer::new(config.render.to_render_config()?);
    let catalog = wiring::load_catalog(&config).await?;

    let (position, item) = match args.position {
        Some(position) => match catalog.get(position) {
            Some(item) => (position, item),
            None => bail!(
                "Position {} is out of range (catalog has {} items)",
                position,
                catalog.len()
            ),
        },
        None => {
            let destination = wiring::resolve_destination(&config)?;
            let cursor = wiring::peek_cursor(&config, destination.as_deref()).await?;
            match select_next(&catalog, &cursor) {
                Selection::Candidate { position, item } => (position, item),
                Selection::Empty => {
                    println!("Catalog is empty, nothing to preview");
                    return Ok(());
                }
                Selection::CaughtUp => {
                    println!("No new items (cursor {})", cursor);
                    return Ok(());
                }
                Selection::UnidentifiedHead => {
                    println!("Catalog head has no url, id or slug to track");
                    return Ok(());
                }
            }
        }
    };

    let output = PreviewOutput {
        position,
        item_id: item.id.as_deref(),
        title: item.label(),
        announcement: renderer.render(item),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Item {}: {}", output.position, output.title);
    if let Some(media) = &output.announcement.media {
        println!("Photo: {}", media);
    }
    if let Some(action) = &output.announcement.action {
        println!("Button: {} -> {}", action.label, action.url);
    }
    println!(
        "Length: {} / {} UTF-16 units",
        utf16_len(&output.announcement.text),
        renderer.config().caption_limit
    );
    println!();
    println!("{}", output.announcement.text);

    Ok(())
}
