//! Popup Gallery - headless popup session
//!
//! Usage: `popup_gallery [items.json] [options.toml]`
//!
//! Builds a popup from a JSON list of image URLs, drawable ids or records
//! and replays a scripted gesture session against it, logging every
//! synchronization step.

mod session;

use anyhow::{Context, Result};
use gallery_core::{normalize_json, PopupOptions};
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    gallery_log::init()?;

    if let Err(e) = gallery_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    let mut args = std::env::args().skip(1);
    let items_path = args.next().map(PathBuf::from);
    let options_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(PopupOptions::default_path);

    let items = match items_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {:?}", path))?;
            let values: Vec<serde_json::Value> = serde_json::from_str(&content)
                .with_context(|| format!("parsing {:?}", path))?;
            // Reject bad lists before anything is shown
            normalize_json(&values)?;
            values
        }
        None => session::sample_items(),
    };

    let options = PopupOptions::load_or_default(&options_path)?;
    tracing::info!("Popup Gallery starting with {} items", items.len());

    session::run(&items, options)
}
