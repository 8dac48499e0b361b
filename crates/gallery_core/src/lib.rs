//! Popup Gallery core
//!
//! This crate contains:
//! - Item normalization
//! - Pager and thumbnail strip controllers
//! - Scroll synchronization between the two
//! - Tab strip mode
//! - Popup options and assembly
//! - Image loading with a disk cache

pub mod config;
pub mod dialog;
pub mod disk_cache;
pub mod error;
pub mod item;
pub mod loader;
pub mod pager;
pub mod strip;
pub mod sync;
pub mod tabs;

pub use config::{Color, EdgeSettlePolicy, PopupOptions, ScaleMode, StripLayout};
pub use dialog::{
    ContentView, NavigationView, PlaceholderView, PopupConfig, PopupDialog, PopupDialogBuilder,
    PresentationShell, SizeSpec, ViewInflater,
};
pub use disk_cache::DiskCache;
pub use error::PopupError;
pub use item::{normalize, normalize_json, DisplayItem, ItemList, ItemRecord, ItemSource, RawItem};
pub use loader::{CachedImageLoader, FileFetcher, ImageLoader, LoadEvent, LoadedImage, SourceFetcher, TargetId};
pub use pager::{PageSpec, PagedViewer, PagerController};
pub use strip::{ScrollState, StripController, ThumbnailStrip};
pub use sync::{Dispatch, DropReason, ScrollSynchronizer, SyncEvent, SyncOrigin, SyncState};
pub use tabs::TabStrip;
