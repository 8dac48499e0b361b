//! Scripted popup session against a headless shell

use anyhow::Result;
use gallery_core::{
    CachedImageLoader, Color, ContentView, DiskCache, Dispatch, FileFetcher, PlaceholderView,
    PopupDialog, PopupDialogBuilder, PopupOptions, PresentationShell, RawItem, SizeSpec,
    ViewInflater,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Layout resources the headless host can inflate
const LAYOUTS: &[&str] = &["loading_progress", "loading_spinner"];

/// Window system stand-in that logs what it would draw
struct HeadlessShell {
    size: SizeSpec,
}

impl PresentationShell for HeadlessShell {
    fn display_size(&self) -> SizeSpec {
        self.size
    }

    fn present(&mut self, content: &ContentView, size: SizeSpec, background: Color) {
        tracing::info!(
            "Present {} pages ({:?}) at {}x{} on {}, style {}",
            content.pages.len(),
            content.navigation,
            size.width,
            size.height,
            background,
            content.dialog_style
        );
    }

    fn close(&mut self) {
        tracing::info!("Window closed");
    }
}

struct LayoutInflater;

impl ViewInflater for LayoutInflater {
    fn inflate(&self, layout: &str) -> Option<PlaceholderView> {
        LAYOUTS.contains(&layout).then(|| PlaceholderView {
            layout: layout.to_string(),
        })
    }
}

pub fn sample_items() -> Vec<Value> {
    (1..=6).map(|i| json!(format!("assets/photo_{}.png", i))).collect()
}

fn log_outcomes(step: &str, outcomes: &[Dispatch]) {
    for outcome in outcomes {
        tracing::info!("{}: {:?}", step, outcome);
    }
}

fn drain_images(dialog: &PopupDialog<HeadlessShell, CachedImageLoader>) {
    while let Some(event) = dialog.loader().wait(Duration::from_millis(50)) {
        match event.result {
            Ok(image) => tracing::info!(
                "Loaded {:?}: {}x{}",
                event.target,
                image.width,
                image.height
            ),
            Err(e) => tracing::warn!("Image for {:?} unavailable: {}", event.target, e),
        }
    }
}

/// Show the popup and replay swipes, drags and a thumb tap
pub fn run(items: &[Value], options: PopupOptions) -> Result<()> {
    let cache = DiskCache::open(&DiskCache::default_dir(), gallery_core::disk_cache::DEFAULT_BUDGET)?;
    let loader = CachedImageLoader::new(cache, Arc::new(FileFetcher::new(".")));
    let shell = HeadlessShell {
        size: SizeSpec { width: 1080, height: 1920 },
    };

    let raw: Vec<RawItem> = items.iter().map(RawItem::from_value).collect();
    let mut dialog = PopupDialogBuilder::with_options(options)
        .list(raw)
        .build(&LayoutInflater, shell, loader)?;

    dialog.show();
    dialog.layout(dialog.shell().display_size().width as f32);
    drain_images(&dialog);

    let last = dialog.config().items().last_index();

    log_outcomes("swipe", &dialog.swipe_to(last.min(2)));
    log_outcomes("animation end", &dialog.finish_strip_scroll());

    log_outcomes("drag start", &dialog.begin_strip_drag());
    log_outcomes("drag", &dialog.drag_strip_by(10_000.0));
    log_outcomes("swipe while dragging", &dialog.swipe_to(0));
    log_outcomes("release", &dialog.release_strip(0.0));

    log_outcomes("tap", &dialog.tap_thumb(0));
    log_outcomes("animation end", &dialog.finish_strip_scroll());
    if dialog.tap_tab(1) {
        tracing::info!("Tab 1 selected");
    }
    drain_images(&dialog);

    tracing::info!("Session ended on item {}", dialog.current_index());
    dialog.on_close_pressed();
    log_outcomes("late animation end", &dialog.finish_strip_scroll());

    Ok(())
}
