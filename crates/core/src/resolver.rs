//! Word → definition resolution.
//!
//! ```text
//! normalize key ─► memory tier ─► persisted tier ─► provider chain ─► shape ─► write both tiers
//!                      │ hit            │ fresh hit (promoted)
//!                      └────────────────┴──────────────────────────────────────► result
//! ```
//!
//! Exhausting the chain is a normal outcome: the "not found" placeholder is
//! shaped and cached like any other definition.

use crate::cache::{MemoryCache, PersistedStore, TwoTierCache, memory};
use crate::cache::store::write_private_atomic;
use crate::entry::{CacheEntry, Freshness, SourceKind};
use crate::provider::ProviderChain;
use crate::word::{capitalize, lemmas, normalize_key};
use crate::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Longest body handed to the notification surface, in characters.
pub const DEFAULT_BODY_MAX_CHARS: usize = 1400;

/// Appended to a clamped body.
pub const TRUNCATION_MARKER: &str = "\n\n… (click to open full)";

/// Characters reserved for the marker when clamping.
const MARKER_ALLOWANCE: usize = 80;

/// Resolver tunables.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Memory tier capacity
    pub memory_capacity: usize,
    /// Memory tier lifetime; offline entries in memory also honour
    /// `freshness.offline_refresh`
    pub memory_ttl: chrono::Duration,
    /// TTL and offline refresh windows
    pub freshness: Freshness,
    /// Body length cap
    pub body_max_chars: usize,
    /// Serve cached entries; when false every request runs the chain
    pub use_cache_reads: bool,
    /// Where the most recent full text is written, if anywhere
    pub last_file: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            memory_capacity: memory::DEFAULT_CAPACITY,
            memory_ttl: Freshness::default().ttl,
            freshness: Freshness::default(),
            body_max_chars: DEFAULT_BODY_MAX_CHARS,
            use_cache_reads: true,
            last_file: None,
        }
    }
}

/// A shaped definition ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Word as requested
    pub word: String,
    /// Normalized cache key
    pub key: String,
    /// Notification title
    pub title: String,
    /// Clamped notification body
    pub body: String,
    /// Untruncated text
    pub full: String,
    /// Provider kind that produced the text
    pub source_kind: SourceKind,
    /// Lemma that matched; `None` when served from cache
    pub used_lemma: Option<String>,
}

impl Resolution {
    /// Whether this result came from either cache tier
    #[must_use]
    pub fn from_cache(&self) -> bool {
        self.used_lemma.is_none()
    }

    fn from_entry(word: &str, entry: CacheEntry) -> Self {
        Self {
            word: word.to_string(),
            key: entry.key,
            title: entry.title,
            body: entry.body,
            full: entry.full,
            source_kind: entry.source_kind,
            used_lemma: None,
        }
    }
}

/// Owns the cache tiers and provider chain shared by every request.
#[derive(Debug)]
pub struct Resolver {
    cache: TwoTierCache,
    chain: ProviderChain,
    config: ResolverConfig,
    last_write: tokio::sync::Mutex<()>,
}

impl Resolver {
    /// Build a resolver over `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory capacity is 0
    pub fn new(config: ResolverConfig, chain: ProviderChain, store: Arc<PersistedStore>) -> Result<Self> {
        let memory = MemoryCache::new(config.memory_capacity, config.memory_ttl)?
            .with_offline_refresh(config.freshness.offline_refresh);
        let cache = TwoTierCache::with_memory(memory, config.freshness, store);
        Ok(Self {
            cache,
            chain,
            config,
            last_write: tokio::sync::Mutex::new(()),
        })
    }

    /// The two cache tiers
    #[must_use]
    pub fn cache(&self) -> &TwoTierCache {
        &self.cache
    }

    /// The persisted tier, for flushing
    #[must_use]
    pub fn store(&self) -> &Arc<PersistedStore> {
        self.cache.store()
    }

    /// The provider chain
    #[must_use]
    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    /// Resolve `word` (already validated) to a display-ready definition.
    ///
    /// Never fails: provider exhaustion produces the "not found" result.
    pub async fn resolve(&self, word: &str) -> Resolution {
        let key = normalize_key(word);

        if self.config.use_cache_reads
            && let Some(entry) = self.cache.get(&key)
        {
            debug!(key = %key, source = %entry.source_kind, "Cache hit");
            let resolution = Resolution::from_entry(word, entry);
            self.write_last(&resolution.full).await;
            return resolution;
        }

        let candidates = lemmas(word);
        let outcome = self.chain.lookup(&candidates).await;
        info!(
            key = %key,
            used = %outcome.used_lemma,
            source = %outcome.source_kind,
            "Resolved definition"
        );

        let full = outcome.text.trim().to_string();
        let entry = CacheEntry {
            key: key.clone(),
            title: shape_title(word, &outcome.used_lemma, outcome.source_kind),
            body: clamp_body(&full, self.config.body_max_chars),
            full,
            timestamp: Utc::now(),
            source_kind: outcome.source_kind,
        };

        self.cache.put(entry.clone());
        self.write_last(&entry.full).await;

        let mut resolution = Resolution::from_entry(word, entry);
        resolution.used_lemma = Some(outcome.used_lemma);
        resolution
    }

    async fn write_last(&self, full: &str) {
        let Some(path) = self.config.last_file.clone() else {
            return;
        };
        let data = full.as_bytes().to_vec();
        // Writes land in the order resolutions finish
        let _guard = self.last_write.lock().await;
        let written =
            tokio::task::spawn_blocking(move || write_private_atomic(&path, &data)).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Failed to write last definition"),
            Err(e) => debug!(error = %e, "Last definition writer panicked"),
        }
    }
}

/// `📘 Requested → Used ☁️`, omitting the arrow when the lemma is the word.
#[must_use]
pub fn shape_title(word: &str, used_lemma: &str, source_kind: SourceKind) -> String {
    let requested = capitalize(word);
    let display = if used_lemma.is_empty() || normalize_key(word) == used_lemma {
        requested
    } else {
        format!("{requested} → {}", capitalize(used_lemma))
    };
    format!("📘 {display} {}", source_kind.indicator())
}

/// Clamp `full` to at most `max_chars` characters for display.
///
/// Longer text is cut on a character boundary, leaving room for
/// [`TRUNCATION_MARKER`].
#[must_use]
pub fn clamp_body(full: &str, max_chars: usize) -> String {
    let text = full.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(MARKER_ALLOWANCE);
    let head: String = text.chars().take(keep).collect();
    format!("{}{TRUNCATION_MARKER}", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_with_lemma() {
        assert_eq!(
            shape_title("legends", "legend", SourceKind::Online),
            "📘 Legends → Legend ☁️"
        );
    }

    #[test]
    fn test_title_same_word_ignores_case() {
        assert_eq!(shape_title("Legend", "legend", SourceKind::Offline), "📘 Legend 🗄️");
        assert_eq!(shape_title("zzqx", "zzqx", SourceKind::None), "📘 Zzqx ❓");
    }

    #[test]
    fn test_clamp_short_body_untouched() {
        assert_eq!(clamp_body("  a story  ", 1400), "a story");
    }

    #[test]
    fn test_clamp_long_body() {
        let full = "x".repeat(2000);
        let body = clamp_body(&full, 1400);

        assert!(body.ends_with(TRUNCATION_MARKER));
        assert!(body.chars().count() <= 1400);
        assert!(full.starts_with(body.trim_end_matches(TRUNCATION_MARKER)));
    }

    #[test]
    fn test_clamp_respects_char_boundaries() {
        let full = "é".repeat(1500);
        let body = clamp_body(&full, 1400);
        assert_eq!(body.chars().filter(|c| *c == 'é').count(), 1320);
    }
}
