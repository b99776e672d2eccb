//! Definition resolution engine for define
//!
//! This crate turns a single word into a display-ready definition:
//! - Lemma candidates for plural surface forms
//! - An ordered chain of lookup providers (two remote services and a local
//!   `dict` backend)
//! - A two-tier cache: a bounded in-process LRU over an atomically replaced
//!   JSON snapshot on disk
//! - A time-windowed guard against duplicate triggers
//!
//! # Overview
//!
//! The [`Resolver`] owns the cache and the provider chain and is shared by
//! every concurrent request. Provider failures are never surfaced to the
//! caller: exhausting the chain yields a cached "No definition found."
//! result.

mod error;

pub mod cache;
pub mod dedupe;
pub mod entry;
pub mod paths;
pub mod provider;
pub mod resolver;
pub mod word;

// Re-export error types at crate root
pub use error::{Error, Result};

pub use cache::{MemoryCache, PersistedStore, TwoTierCache};
pub use dedupe::DedupeGuard;
pub use entry::{CacheEntry, Freshness, SourceKind};
pub use provider::{
    DefinitionProvider, LookupOutcome, NOT_FOUND_TEXT, ProviderChain, ProviderConfig,
};
pub use resolver::{Resolution, Resolver, ResolverConfig};
pub use word::{lemmas, pick_word, valid_word};
