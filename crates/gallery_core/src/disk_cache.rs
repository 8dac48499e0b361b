//! Content-addressed image cache on disk
//!
//! Files are named by the xxh3 hash of the item's source key. The cache keeps
//! its total size under a byte budget by evicting the least recently used files
//! first. A hit refreshes the file's modification time.

use crate::error::{PopupError, Result};
use crate::item::ItemSource;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use xxhash_rust::xxh3::xxh3_64;

/// Cache budget used by the popup
pub const DEFAULT_BUDGET: u64 = 20 * 1024 * 1024;

/// Disk cache for fetched image bytes
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
    budget: u64,
}

impl DiskCache {
    /// Open or create the cache directory
    pub fn open(dir: &Path, budget: u64) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            budget,
        })
    }

    /// Default cache location
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("com", "PopupGallery", "PopupGallery")
            .map(|dirs| dirs.cache_dir().join("images"))
            .unwrap_or_else(|| PathBuf::from("./cache/images"))
    }

    /// Cache key of a source
    pub fn key_for(source: &ItemSource) -> u64 {
        xxh3_64(source.cache_key().as_bytes())
    }

    fn path_for(&self, key: u64) -> PathBuf {
        self.dir.join(format!("{:016x}", key))
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    /// Retrieve cached bytes and mark the entry as recently used
    pub fn get(&self, key: u64) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(data) => {
                if let Err(e) = touch(&path) {
                    tracing::debug!("Failed to refresh cache entry {:?}: {}", path, e);
                }
                Ok(Some(data))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, key: u64) -> bool {
        self.path_for(key).is_file()
    }

    /// Store bytes, then evict old entries until the cache fits its budget
    pub fn put(&self, key: u64, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;

        let evicted = self.evict(key)?;
        if evicted > 0 {
            tracing::debug!("Image cache evicted {} entries", evicted);
        }
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(PathBuf, u64, SystemTime)>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((entry.path(), metadata.len(), modified));
        }
        Ok(entries)
    }

    /// Total bytes on disk
    pub fn total_size(&self) -> Result<u64> {
        Ok(self.entries()?.iter().map(|(_, len, _)| len).sum())
    }

    /// Remove least recently used entries, never `keep`, until under budget
    fn evict(&self, keep: u64) -> Result<usize> {
        let mut entries = self.entries()?;
        let mut total: u64 = entries.iter().map(|(_, len, _)| len).sum();
        if total <= self.budget {
            return Ok(0);
        }

        let keep_path = self.path_for(keep);
        entries.retain(|(path, _, _)| *path != keep_path);
        entries.sort_by(|a, b| a.2.cmp(&b.2).then_with(|| a.0.cmp(&b.0)));

        let mut evicted = 0;
        for (path, len, _) in entries {
            if total <= self.budget {
                break;
            }
            std::fs::remove_file(&path)
                .map_err(|e| PopupError::Cache(format!("{:?}: {}", path, e)))?;
            total = total.saturating_sub(len);
            evicted += 1;
        }
        Ok(evicted)
    }

    /// Remove every cached entry
    pub fn clear(&self) -> Result<()> {
        for (path, _, _) in self.entries()? {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn touch(path: &Path) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}
