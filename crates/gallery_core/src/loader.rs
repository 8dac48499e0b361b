//! Image loading service
//!
//! The popup asks for an image per page and per thumb and cancels requests
//! for views that went away. One worker thread serves requests newest first,
//! backed by the on-disk [`DiskCache`].

use crate::disk_cache::DiskCache;
use crate::error::{PopupError, Result};
use crate::item::ItemSource;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// View an image is loaded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    Page(usize),
    Thumb(usize),
}

/// Request/cancel surface used by the popup
pub trait ImageLoader {
    /// Load `source` into `target`, replacing any earlier request for it
    fn request(&self, source: &ItemSource, target: TargetId);

    /// Forget the request for `target`; its result is never delivered
    fn cancel(&self, target: TargetId);
}

/// Produces the encoded bytes of a source (network, packaged resources)
pub trait SourceFetcher: Send + Sync + 'static {
    fn fetch(&self, source: &ItemSource) -> Result<Vec<u8>>;
}

/// Decoded image
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels
    pub data: Vec<u8>,
    pub cache_key: u64,
}

/// Result of one request
#[derive(Debug)]
pub struct LoadEvent {
    pub target: TargetId,
    pub result: Result<LoadedImage>,
    generation: u64,
}

#[derive(Debug)]
struct Task {
    source: ItemSource,
    target: TargetId,
    generation: u64,
}

#[derive(Default)]
struct Queue {
    /// Newest last: popped first
    stack: Vec<Task>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    wake: Condvar,
    /// Live generation per target; absent means cancelled
    generations: Mutex<HashMap<TargetId, u64>>,
    next_generation: Mutex<u64>,
}

impl Shared {
    fn is_current(&self, target: TargetId, generation: u64) -> bool {
        self.generations.lock().get(&target) == Some(&generation)
    }
}

/// Disk-cached loader with a single LIFO worker
pub struct CachedImageLoader {
    shared: Arc<Shared>,
    results: Receiver<LoadEvent>,
    worker: Option<JoinHandle<()>>,
}

impl CachedImageLoader {
    pub fn new(cache: DiskCache, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let shared = Arc::new(Shared::default());
        let (result_tx, results) = crossbeam_channel::unbounded();

        let worker_shared = shared.clone();
        let worker = std::thread::Builder::new()
            .name("image-loader".into())
            .spawn(move || worker_loop(worker_shared, cache, fetcher, result_tx))
            .map_err(|e| tracing::error!("Failed to spawn image loader: {}", e))
            .ok();

        Self {
            shared,
            results,
            worker,
        }
    }

    /// Drain delivered results without blocking
    pub fn poll(&self) -> Vec<LoadEvent> {
        self.results
            .try_iter()
            .filter(|event| self.shared.is_current(event.target, event.generation))
            .collect()
    }

    /// Wait up to `timeout` for the next live result
    pub fn wait(&self, timeout: Duration) -> Option<LoadEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let event = self.results.recv_timeout(remaining).ok()?;
            if self.shared.is_current(event.target, event.generation) {
                return Some(event);
            }
        }
    }

    /// Number of requests waiting for the worker
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().stack.len()
    }
}

impl ImageLoader for CachedImageLoader {
    fn request(&self, source: &ItemSource, target: TargetId) {
        let generation = {
            let mut next = self.shared.next_generation.lock();
            *next += 1;
            *next
        };
        self.shared.generations.lock().insert(target, generation);

        let mut queue = self.shared.queue.lock();
        if queue.shutdown {
            return;
        }
        queue.stack.retain(|task| task.target != target);
        queue.stack.push(Task {
            source: source.clone(),
            target,
            generation,
        });
        drop(queue);
        self.shared.wake.notify_one();
    }

    fn cancel(&self, target: TargetId) {
        self.shared.generations.lock().remove(&target);
        self.shared.queue.lock().stack.retain(|task| task.target != target);
    }
}

impl Drop for CachedImageLoader {
    fn drop(&mut self) {
        self.shared.queue.lock().shutdown = true;
        self.shared.wake.notify_all();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("Image loader worker panicked");
            }
        }
    }
}

fn worker_loop(
    shared: Arc<Shared>,
    cache: DiskCache,
    fetcher: Arc<dyn SourceFetcher>,
    results: Sender<LoadEvent>,
) {
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.shutdown {
                    return;
                }
                if let Some(task) = queue.stack.pop() {
                    break task;
                }
                shared.wake.wait(&mut queue);
            }
        };

        if !shared.is_current(task.target, task.generation) {
            continue;
        }

        let result = load(&task.source, &cache, fetcher.as_ref());
        if let Err(e) = &result {
            tracing::warn!("Image load for {:?} failed: {}", task.target, e);
        }

        if !shared.is_current(task.target, task.generation) {
            tracing::trace!("Dropping result for cancelled {:?}", task.target);
            continue;
        }
        let event = LoadEvent {
            target: task.target,
            result,
            generation: task.generation,
        };
        if results.send(event).is_err() {
            return;
        }
    }
}

/// Cache lookup, fetch on miss, decode
fn load(source: &ItemSource, cache: &DiskCache, fetcher: &dyn SourceFetcher) -> Result<LoadedImage> {
    let cache_key = DiskCache::key_for(source);

    let bytes = match cache.get(cache_key)? {
        Some(bytes) => bytes,
        None => {
            tracing::debug!("Fetching {}", source.cache_key());
            let bytes = fetcher.fetch(source)?;
            if let Err(e) = cache.put(cache_key, &bytes) {
                tracing::warn!("Image cache write failed: {}", e);
            }
            bytes
        }
    };

    let rgba = image::load_from_memory(&bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(LoadedImage {
        width,
        height,
        data: rgba.into_raw(),
        cache_key,
    })
}

/// Reads images from a local directory.
///
/// Drawables resolve to `<root>/drawable/<id>.png`; URLs are read as paths
/// relative to `root` (a `file://` prefix is stripped). Remote URLs fail.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_url(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(PopupError::Fetch(format!("remote source not available: {}", url)));
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read(self.root.join(path))
            .map_err(|e| PopupError::Fetch(format!("{}: {}", url, e)))
    }

    fn read_drawable(&self, id: u32) -> Result<Vec<u8>> {
        let path = self.root.join("drawable").join(format!("{}.png", id));
        std::fs::read(&path).map_err(|e| PopupError::Fetch(format!("{:?}: {}", path, e)))
    }
}

impl SourceFetcher for FileFetcher {
    fn fetch(&self, source: &ItemSource) -> Result<Vec<u8>> {
        match source {
            ItemSource::Drawable(id) => self.read_drawable(*id),
            ItemSource::Url(url) => self.read_url(url),
            ItemSource::Record(record) => match (&record.image_url, record.drawable_id) {
                (Some(url), _) => self.read_url(url),
                (None, Some(id)) => self.read_drawable(id),
                (None, None) => Err(PopupError::Fetch("record has no image".into())),
            },
        }
    }
}
