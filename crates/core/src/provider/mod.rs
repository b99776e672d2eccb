//! Definition providers and the ordered fallback chain.
//!
//! Providers are tried in priority order. Every lemma candidate is tried
//! against one provider before the chain moves on to the next provider, so
//! a primary-service hit on a lemma beats a secondary-service hit on the
//! surface form.

pub mod dictionary_api;
pub mod http;
pub mod offline;
pub mod text;
pub mod wiktionary;

pub use dictionary_api::DictionaryApiProvider;
pub use offline::OfflineProvider;
pub use wiktionary::WiktionaryProvider;

use crate::Result;
use crate::entry::SourceKind;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use text::normalize_text;
use tokio::time::timeout;
use tracing::debug;

/// Text recorded when no provider knows a word.
pub const NOT_FOUND_TEXT: &str = "No definition found.";

/// A source of definitions for a single word.
#[async_trait]
pub trait DefinitionProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Tag recorded on entries this provider resolves
    fn source_kind(&self) -> SourceKind;

    /// Deadline applied by the chain to each lookup
    fn timeout(&self) -> Duration;

    /// Return non-empty definition text for `word`, or fail.
    async fn lookup(&self, word: &str) -> Result<String>;
}

/// Result of running the chain over a set of lemma candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    /// Normalized definition text, or [`NOT_FOUND_TEXT`]
    pub text: String,
    /// Candidate that produced the text
    pub used_lemma: String,
    /// Provider kind, `None` when nothing matched
    pub source_kind: SourceKind,
}

impl LookupOutcome {
    /// Terminal outcome when every provider failed for every candidate.
    #[must_use]
    pub fn not_found(word: impl Into<String>) -> Self {
        Self {
            text: NOT_FOUND_TEXT.to_string(),
            used_lemma: word.into(),
            source_kind: SourceKind::None,
        }
    }

    /// Whether a provider produced this outcome
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.source_kind != SourceKind::None
    }
}

/// Settings for the built-in providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Primary dictionary API base URL
    pub primary_base_url: String,
    /// Wiktionary definitions API base URL
    pub secondary_base_url: String,
    /// Deadline for each remote call
    pub http_timeout: Duration,
    /// Deadline for each offline command invocation
    pub command_timeout: Duration,
    /// Offline dictionary client
    pub dict_program: PathBuf,
    /// Offline database queried first
    pub dict_database: String,
    /// Whether to include the offline provider
    pub offline: bool,
    /// User-Agent sent to remote services
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            primary_base_url: dictionary_api::DEFAULT_BASE_URL.to_string(),
            secondary_base_url: wiktionary::DEFAULT_BASE_URL.to_string(),
            http_timeout: Duration::from_millis(900),
            command_timeout: Duration::from_millis(180),
            dict_program: PathBuf::from(offline::DEFAULT_PROGRAM),
            dict_database: offline::DEFAULT_DATABASE.to_string(),
            offline: true,
            user_agent: format!("define/{} (rust)", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Ordered list of providers.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn DefinitionProvider>>,
}

impl ProviderChain {
    /// Chain over `providers` in the given priority order
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn DefinitionProvider>>) -> Self {
        Self { providers }
    }

    /// Primary API, Wiktionary, then (unless disabled) the offline backend.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = http::build_client(&config.user_agent, config.http_timeout)?;

        let mut providers: Vec<Arc<dyn DefinitionProvider>> = vec![
            Arc::new(DictionaryApiProvider::new(
                client.clone(),
                config.primary_base_url.clone(),
                config.http_timeout,
            )),
            Arc::new(WiktionaryProvider::new(
                client,
                config.secondary_base_url.clone(),
                config.http_timeout,
            )),
        ];
        if config.offline {
            providers.push(Arc::new(OfflineProvider::new(
                config.dict_program.clone(),
                config.dict_database.clone(),
                config.command_timeout,
            )));
        }

        Ok(Self::new(providers))
    }

    /// Provider names in priority order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Number of providers
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// First non-empty definition across providers and candidates.
    ///
    /// Failures and timeouts are logged and skipped; exhausting the chain
    /// yields [`LookupOutcome::not_found`] for the first candidate.
    pub async fn lookup(&self, candidates: &[String]) -> LookupOutcome {
        for provider in &self.providers {
            for candidate in candidates {
                let deadline = provider.timeout();
                match timeout(deadline, provider.lookup(candidate)).await {
                    Ok(Ok(raw)) => {
                        let text = normalize_text(&raw);
                        if text.is_empty() {
                            debug!(provider = provider.name(), candidate, "Provider returned blank text");
                            continue;
                        }
                        debug!(provider = provider.name(), candidate, "Definition found");
                        return LookupOutcome {
                            text,
                            used_lemma: candidate.clone(),
                            source_kind: provider.source_kind(),
                        };
                    }
                    Ok(Err(e)) => {
                        debug!(provider = provider.name(), candidate, error = %e, "Provider lookup failed");
                    }
                    Err(_) => {
                        debug!(
                            provider = provider.name(),
                            candidate,
                            timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                            "Provider lookup timed out"
                        );
                    }
                }
            }
        }

        LookupOutcome::not_found(candidates.first().cloned().unwrap_or_default())
    }
}

impl std::fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderChain")
            .field("providers", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use parking_lot::Mutex;

    /// Records every call; answers only for the words it knows.
    struct Scripted {
        name: &'static str,
        kind: SourceKind,
        known: Vec<(&'static str, &'static str)>,
        calls: Arc<Mutex<Vec<String>>>,
        delay: Duration,
    }

    #[async_trait]
    impl DefinitionProvider for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }
        fn source_kind(&self) -> SourceKind {
            self.kind
        }
        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
        async fn lookup(&self, word: &str) -> Result<String> {
            self.calls.lock().push(format!("{}:{word}", self.name));
            tokio::time::sleep(self.delay).await;
            self.known
                .iter()
                .find(|(w, _)| *w == word)
                .map(|(_, text)| (*text).to_string())
                .ok_or_else(|| Error::provider(self.name, "unknown word"))
        }
    }

    fn scripted(
        name: &'static str,
        kind: SourceKind,
        known: Vec<(&'static str, &'static str)>,
        calls: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<dyn DefinitionProvider> {
        Arc::new(Scripted {
            name,
            kind,
            known,
            calls: Arc::clone(calls),
            delay: Duration::ZERO,
        })
    }

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| (*w).to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_lemmas_tried_before_next_provider() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = ProviderChain::new(vec![
            scripted("primary", SourceKind::Online, vec![], &calls),
            scripted("secondary", SourceKind::SecondaryOnline, vec![("legend", "a story")], &calls),
        ]);

        let outcome = chain.lookup(&words(&["legends", "legend"])).await;

        assert_eq!(outcome.used_lemma, "legend");
        assert_eq!(outcome.source_kind, SourceKind::SecondaryOnline);
        assert_eq!(
            *calls.lock(),
            vec!["primary:legends", "primary:legend", "secondary:legends", "secondary:legend"]
        );
    }

    #[tokio::test]
    async fn test_surface_form_preferred_over_lemma() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = ProviderChain::new(vec![scripted(
            "primary",
            SourceKind::Online,
            vec![("glasses", "eyewear"), ("glass", "a material")],
            &calls,
        )]);

        let outcome = chain.lookup(&words(&["glasses", "glass"])).await;

        assert_eq!(outcome.text, "eyewear");
        assert_eq!(outcome.used_lemma, "glasses");
        assert_eq!(calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_output_is_normalized_and_blank_skipped() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = ProviderChain::new(vec![
            scripted("blank", SourceKind::Online, vec![("legend", "  \n \n")], &calls),
            scripted(
                "offline",
                SourceKind::Offline,
                vec![("legend", "\n  A   story\n\n\n of old \n")],
                &calls,
            ),
        ]);

        let outcome = chain.lookup(&words(&["legend"])).await;

        assert_eq!(outcome.text, "A story\n\nof old");
        assert_eq!(outcome.source_kind, SourceKind::Offline);
    }

    #[tokio::test]
    async fn test_exhaustion_yields_not_found() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = ProviderChain::new(vec![
            scripted("primary", SourceKind::Online, vec![], &calls),
            scripted("offline", SourceKind::Offline, vec![], &calls),
        ]);

        let outcome = chain.lookup(&words(&["zzqx"])).await;

        assert_eq!(outcome, LookupOutcome::not_found("zzqx"));
        assert!(!outcome.is_found());
        assert_eq!(outcome.text, NOT_FOUND_TEXT);
    }

    #[tokio::test]
    async fn test_slow_provider_is_abandoned() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let slow: Arc<dyn DefinitionProvider> = Arc::new(Scripted {
            name: "slow",
            kind: SourceKind::Online,
            known: vec![("legend", "too late")],
            calls: Arc::clone(&calls),
            delay: Duration::from_secs(5),
        });
        let chain = ProviderChain::new(vec![
            slow,
            scripted("secondary", SourceKind::SecondaryOnline, vec![("legend", "in time")], &calls),
        ]);

        let outcome = chain.lookup(&words(&["legend"])).await;

        assert_eq!(outcome.text, "in time");
    }

    #[test]
    fn test_from_config_respects_offline_flag() {
        let chain = ProviderChain::from_config(&ProviderConfig::default()).unwrap();
        assert_eq!(chain.names(), vec!["dictionaryapi", "wiktionary", "dict"]);

        let online_only = ProviderChain::from_config(&ProviderConfig {
            offline: false,
            ..ProviderConfig::default()
        })
        .unwrap();
        assert_eq!(online_only.names(), vec!["dictionaryapi", "wiktionary"]);
    }
}
