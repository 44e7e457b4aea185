//! Cache Store Module
//!
//! Main cache engine combining the LRU list with TTL expiry and loader-driven refresh.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::cache::entry::normalize_ttl;
use crate::cache::{CacheStats, Entry, LoadError, Loaded, Loader, LruList};
use crate::config::CacheConfig;

/// State guarded by the cache lock.
struct Inner<V> {
    entries: LruList<V>,
    stats: CacheStats,
}

// == Cache ==
/// Thread-safe, capacity-bounded cache with LRU eviction and TTL expiry.
///
/// Values are never inserted directly: [`get`](Cache::get) calls the loader on
/// a miss or when the entry is stale, stores the result and returns it.
///
/// The loader runs without the lock held. Two callers missing on the same key
/// at the same time will both run the loader, and the last one to store its
/// result wins. Callers that need exactly-once loading must coalesce above the
/// cache.
///
/// Stale entries are not purged in the background. They are reloaded on their
/// next access or leave through LRU eviction.
pub struct Cache<V> {
    inner: RwLock<Inner<V>>,
    capacity: usize,
    global_ttl: Option<Duration>,
    loader: Box<dyn Loader<V>>,
}

impl<V: Clone> Cache<V> {
    // == Constructor ==
    /// Creates a new cache.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries. With 0 nothing is ever stored
    ///   and every `get` calls the loader.
    /// * `global_ttl` - Age after which any entry is stale. Zero disables the rule.
    /// * `loader` - Computes values on miss or expiry
    pub fn new(capacity: usize, global_ttl: Duration, loader: impl Loader<V> + 'static) -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: LruList::with_capacity(capacity),
                stats: CacheStats::new(),
            }),
            capacity,
            global_ttl: normalize_ttl(Some(global_ttl)),
            loader: Box::new(loader),
        }
    }

    /// Creates a cache sized and timed by `config`.
    pub fn with_config(config: &CacheConfig, loader: impl Loader<V> + 'static) -> Self {
        Self::new(config.capacity, config.global_ttl(), loader)
    }

    // == Get ==
    /// Returns the value for `key`, loading it if absent or stale.
    ///
    /// A fresh hit is promoted to most recently used. On loader failure the
    /// error is returned unchanged, partial value included, and nothing is
    /// stored: the next `get` will call the loader again.
    pub fn get(&self, key: &str) -> Result<V, LoadError<V>> {
        {
            let mut guard = self.inner.write();
            let inner = &mut *guard;
            let now = Instant::now();

            match inner.entries.get(key) {
                Some(entry) if !entry.is_expired(self.global_ttl, now) => {
                    let value = entry.value.clone();
                    inner.entries.touch(key);
                    inner.stats.record_hit();
                    trace!(key, "cache hit");
                    return Ok(value);
                }
                Some(_) => debug!(key, "entry stale, reloading"),
                None => debug!(key, "cache miss"),
            }
            inner.stats.record_miss();
        }

        match self.loader.load(key) {
            Ok(Loaded { value, ttl }) => {
                self.set(key, value.clone(), ttl);
                Ok(value)
            }
            Err(err) => {
                self.inner.write().stats.record_load_failure();
                debug!(key, error = %err.source, "loader failed");
                Err(err)
            }
        }
    }

    // == Set ==
    /// Upserts a freshly loaded value.
    ///
    /// Returns true if an existing entry was updated, false if a new entry
    /// was inserted (evicting the least recently used one when full).
    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> bool {
        let now = Instant::now();
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(entry) = inner.entries.get_mut(key) {
            entry.refresh(value, ttl, now);
            inner.entries.touch(key);
            return true;
        }

        if self.capacity == 0 {
            return false;
        }

        if inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.entries.pop_back() {
                inner.stats.record_eviction();
                debug!(key = %evicted.key, "evicted least recently used entry");
            }
        }

        inner
            .entries
            .push_front(Entry::new(key.to_string(), value, ttl, now));
        inner.stats.set_total_entries(inner.entries.len());
        false
    }
}

impl<V> Cache<V> {
    // == Inspection ==
    /// Returns the current number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cache-wide TTL, `Duration::ZERO` when disabled.
    pub fn global_ttl(&self) -> Duration {
        self.global_ttl.unwrap_or_default()
    }

    /// Checks if an entry exists for `key` without promoting it.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().entries.contains(key)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner.read().entries.keys()
    }

    /// Time left before the entry for `key` goes stale.
    ///
    /// None if the key is absent or the entry never expires.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.read();
        inner
            .entries
            .get(key)?
            .ttl_remaining(self.global_ttl, Instant::now())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats
    }

    // == Remove ==
    /// Drops the entry for `key`. Returns whether one existed.
    pub fn remove(&self, key: &str) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let removed = inner.entries.remove(key).is_some();
        inner.stats.set_total_entries(inner.entries.len());
        removed
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut guard = self.inner.write();
        guard.entries.clear();
        guard.stats.set_total_entries(0);
    }
}

impl<V> fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("global_ttl", &self.global_ttl)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
