//! Time-bounded in-process cache of loaded tables.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};
use tracing::debug;

use crate::error::Result;

type CacheKey = (PathBuf, Option<String>);

struct Entry<T> {
    loaded_at: Instant,
    modified: Option<SystemTime>,
    value: Arc<T>,
}

/// Caches one parsed table per `(path, sheet)`.
///
/// An entry is reused while it is younger than `ttl` and the source file's
/// modification time has not changed.
pub struct TableCache<T> {
    ttl: Duration,
    entries: HashMap<CacheKey, Entry<T>>,
}

impl<T> TableCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached table for `path`/`sheet`, or run `load` and cache it.
    pub fn get_or_load<F>(&mut self, path: &Path, sheet: Option<&str>, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let key = (path.to_path_buf(), sheet.map(str::to_string));
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();

        if let Some(entry) = self.entries.get(&key) {
            if entry.loaded_at.elapsed() < self.ttl && entry.modified == modified {
                debug!(path = %path.display(), "table cache hit");
                return Ok(Arc::clone(&entry.value));
            }
        }

        debug!(path = %path.display(), "table cache miss");
        let value = Arc::new(load()?);
        self.entries.insert(
            key,
            Entry {
                loaded_at: Instant::now(),
                modified,
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Drop every cached sheet of `path`.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|(p, _), _| p != path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
