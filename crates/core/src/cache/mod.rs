//! Two-tier definition cache.
//!
//! Lookups consult the in-process LRU tier first and fall back to the
//! persisted snapshot, promoting fresh persisted entries into memory.
//! Writes go through to both tiers; the persisted tier is only marked dirty
//! and written later by [`PersistedStore::flush`].

pub mod memory;
pub mod store;

pub use memory::MemoryCache;
pub use store::{PersistedStore, Snapshot};

use crate::Result;
use crate::entry::{CacheEntry, Freshness};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::trace;

/// Memory tier backed by a shared persisted store.
#[derive(Debug)]
pub struct TwoTierCache {
    memory: MemoryCache,
    store: Arc<PersistedStore>,
    freshness: Freshness,
}

impl TwoTierCache {
    /// Create a cache whose memory tier holds at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns an error if `capacity` is 0
    pub fn new(capacity: usize, freshness: Freshness, store: Arc<PersistedStore>) -> Result<Self> {
        let memory =
            MemoryCache::new(capacity, freshness.ttl)?.with_offline_refresh(freshness.offline_refresh);
        Ok(Self::with_memory(memory, freshness, store))
    }

    /// Combine an existing memory tier, which may use a shorter TTL, with `store`.
    #[must_use]
    pub fn with_memory(memory: MemoryCache, freshness: Freshness, store: Arc<PersistedStore>) -> Self {
        Self {
            memory,
            store,
            freshness,
        }
    }

    /// Look up `key` in memory, then in the persisted tier.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get) with an explicit clock.
    #[must_use]
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CacheEntry> {
        if let Some(entry) = self.memory.get_at(key, now) {
            trace!(key, "memory cache hit");
            return Some(entry);
        }

        let entry = self.store.get(key)?;
        if !entry.is_fresh(&self.freshness, now) {
            trace!(key, source = %entry.source_kind, "persisted entry is stale");
            return None;
        }

        trace!(key, "persisted cache hit, promoting");
        self.memory.put(entry.clone());
        Some(entry)
    }

    /// Write `entry` to both tiers.
    pub fn put(&self, entry: CacheEntry) {
        self.memory.put(entry.clone());
        self.store.insert(entry);
    }

    /// The in-process tier
    #[must_use]
    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    /// The persisted tier
    #[must_use]
    pub fn store(&self) -> &Arc<PersistedStore> {
        &self.store
    }
}
