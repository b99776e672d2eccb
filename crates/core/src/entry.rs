//! Resolved definition records shared by both cache tiers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which provider produced a definition.
///
/// Governs how long a persisted entry is considered fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Primary remote dictionary service
    Online,
    /// Secondary remote dictionary service
    #[serde(alias = "wiktionary")]
    SecondaryOnline,
    /// Local offline dictionary backend
    Offline,
    /// No provider produced a definition
    None,
}

impl SourceKind {
    /// Short glyph shown next to the title in notifications.
    #[must_use]
    pub const fn indicator(self) -> &'static str {
        match self {
            Self::Online => "☁️",
            Self::SecondaryOnline => "🧾",
            Self::Offline => "🗄️",
            Self::None => "❓",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::SecondaryOnline => write!(f, "secondaryOnline"),
            Self::Offline => write!(f, "offline"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Freshness windows applied to cached entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Freshness {
    /// Lifetime of every non-offline entry
    pub ttl: Duration,
    /// Lifetime of offline entries
    pub offline_refresh: Duration,
}

impl Default for Freshness {
    fn default() -> Self {
        Self {
            ttl: Duration::days(30),
            offline_refresh: Duration::hours(12),
        }
    }
}

/// One resolved definition.
///
/// `body` is a length-bounded rendering of `full`; `full` is never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Lowercased word; the map key in the persisted snapshot
    #[serde(skip)]
    pub key: String,
    /// Short notification label
    pub title: String,
    /// Display-clamped text
    pub body: String,
    /// Untruncated definition text
    pub full: String,
    /// Resolution time
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    /// Provider that produced the definition
    #[serde(rename = "source")]
    pub source_kind: SourceKind,
}

impl CacheEntry {
    /// Age of the entry at `now`.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.timestamp)
    }

    /// Whether the entry may be served, honouring the shorter offline
    /// refresh window.
    #[must_use]
    pub fn is_fresh(&self, freshness: &Freshness, now: DateTime<Utc>) -> bool {
        let limit = match self.source_kind {
            SourceKind::Offline => freshness.offline_refresh,
            _ => freshness.ttl,
        };
        self.age(now) <= limit
    }
}
