//! In-process LRU tier

use crate::entry::{CacheEntry, Freshness};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// Default number of entries held in memory.
pub const DEFAULT_CAPACITY: usize = 2500;

/// Thread-safe, bounded, recency-ordered definition cache.
///
/// Entries older than the TTL (measured from their resolution time) are
/// treated as absent and dropped when touched. Offline entries expire after
/// the shorter of the TTL and the offline refresh window.
pub struct MemoryCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    freshness: Freshness,
}

impl MemoryCache {
    /// Creates a new memory tier
    ///
    /// # Errors
    ///
    /// Returns an error if capacity is 0
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| Error::configuration("Memory cache capacity must be non-zero"))?;

        Ok(Self {
            cache: Mutex::new(LruCache::new(capacity)),
            freshness: Freshness {
                ttl,
                offline_refresh: Freshness::default().offline_refresh.min(ttl),
            },
        })
    }

    /// Expire offline entries after `refresh` (capped at the TTL)
    #[must_use]
    pub fn with_offline_refresh(mut self, refresh: Duration) -> Self {
        self.freshness.offline_refresh = refresh.min(self.freshness.ttl);
        self
    }

    /// Gets an entry, refreshing its recency, if present and within TTL
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(key) {
            if entry.is_fresh(&self.freshness, now) {
                return Some(entry.clone());
            }
            cache.pop(key);
        }

        None
    }

    /// Inserts or replaces an entry, returning the key evicted to make room
    pub fn put(&self, entry: CacheEntry) -> Option<String> {
        let key = entry.key.clone();
        let mut cache = self.cache.lock();
        match cache.push(key.clone(), entry) {
            Some((evicted, _)) if evicted != key => Some(evicted),
            _ => None,
        }
    }

    /// Whether `key` is resident, without touching recency or TTL
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.cache.lock().contains(key)
    }

    /// Returns the number of resident entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Returns true if the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("len", &self.len())
            .field("freshness", &self.freshness)
            .finish()
    }
}
