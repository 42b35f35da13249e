//! Read-if-changed caching keyed on modification time
//!
//! The phrase file, the pronunciation file and the soundbite directory are
//! only re-read when their modification time differs from the one seen at
//! the last load. The staleness decision takes the current time as an
//! argument so it can be driven without touching the filesystem.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::Result;
use crate::files;

/// Cached value derived from a file or directory
#[derive(Debug)]
pub struct ModTimeCache<T> {
    path: PathBuf,
    last_seen: Option<SystemTime>,
    value: T,
}

impl<T: Default> ModTimeCache<T> {
    /// Create an empty cache for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_seen: None,
            value: T::default(),
        }
    }

    /// Path backing this cache
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Currently cached value
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Modification time observed at the last successful load
    #[must_use]
    pub const fn last_seen(&self) -> Option<SystemTime> {
        self.last_seen
    }

    /// Whether a source with modification time `current` needs reloading
    #[must_use]
    pub fn is_stale(&self, current: Option<SystemTime>) -> bool {
        current != self.last_seen
    }

    /// Reload through `load` if `current` differs from the last seen time
    ///
    /// `current == None` means the source is missing: the cache resets to
    /// an empty value. Returns the new value when it changed. A failing
    /// loader leaves the previous value and timestamp in place so the next
    /// call retries.
    pub fn refresh_if_stale<F>(&mut self, current: Option<SystemTime>, load: F) -> Option<&T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        if !self.is_stale(current) {
            return None;
        }

        let Some(modified) = current else {
            tracing::debug!(path = %self.path.display(), "source removed, clearing cache");
            self.last_seen = None;
            self.value = T::default();
            return Some(&self.value);
        };

        match load(&self.path) {
            Ok(value) => {
                tracing::debug!(path = %self.path.display(), "reloaded cached source");
                self.value = value;
                self.last_seen = Some(modified);
                Some(&self.value)
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to reload source");
                None
            }
        }
    }

    /// Stat the backing path and reload through `load` when it changed
    pub fn refresh<F>(&mut self, load: F) -> Option<&T>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let current = files::modified(&self.path);
        self.refresh_if_stale(current, load)
    }
}
