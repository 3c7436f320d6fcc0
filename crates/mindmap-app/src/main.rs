//! Headless mindmap shell: restore, replay, save, export.

mod cli;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use kurbo::Size;
use mindmap_core::title::{self, DEFAULT_ANCHOR_SEGMENT};
use mindmap_core::{FileStorage, HeadlessHost, Mindmap, MindmapConfig};
use script::Replay;
use std::sync::Arc;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => MindmapConfig::load(path)?,
        None => MindmapConfig::default(),
    };

    if let Some(page_url) = &cli.page_url {
        let id = title::assignment_id(page_url);
        log::info!("{}", title::mindmap_title(&id));
    }
    let parent = title::parent_page_title(cli.referrer.as_deref(), DEFAULT_ANCHOR_SEGMENT);
    if !parent.is_empty() {
        log::info!("Parent page: {parent}");
    }

    let storage = match &cli.store {
        Some(dir) => FileStorage::new(dir.clone())?,
        None => FileStorage::default_location()?,
    };
    log::info!("Using store at {}", storage.base_path().display());

    let mut host = HeadlessHost::new(Size::new(cli.width, cli.height), cli.dpr);
    if let Some((width, height)) = cli.screen {
        host = host.with_fullscreen(Size::new(width, height));
    }

    let start = Instant::now();
    let session = Mindmap::new(config, Arc::new(storage), host, start)
        .context("Failed to create mindmap surface")?;
    let mut replay = Replay::new(session, start);

    if let Some(path) = &cli.script {
        let steps = script::load(path)?;
        log::info!("Replaying {} steps from {}", steps.len(), path.display());
        replay.run(&steps);
    }
    replay.finish();

    if let Some(path) = &cli.export {
        let png = match replay.last_export() {
            Some(png) => png.to_vec(),
            None => replay.session().snapshot()?.into_png(),
        };
        std::fs::write(path, &png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Exported {} bytes to {}", png.len(), path.display());
    }

    let surface = replay.session().surface();
    log::info!(
        "Done: {}x{} device pixels, {} painted",
        surface.width(),
        surface.height(),
        surface.painted_pixels()
    );
    Ok(())
}
