//! Secondary remote provider backed by the Wiktionary REST definitions API.

use super::DefinitionProvider;
use super::http::{endpoint, get_json};
use super::text::strip_html;
use crate::entry::SourceKind;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default endpoint; the word is appended as the last path segment.
pub const DEFAULT_BASE_URL: &str = "https://en.wiktionary.org/api/rest_v1/page/definition/";

/// Bullet definitions rendered per word.
const MAX_DEFINITIONS: usize = 7;

const NAME: &str = "wiktionary";

#[derive(Debug, Deserialize)]
struct Bucket {
    #[serde(default)]
    definitions: Vec<Definition>,
}

/// Older responses carried bare strings, current ones carry objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Definition {
    Plain(String),
    Rich { definition: String },
}

impl Definition {
    fn text(&self) -> &str {
        match self {
            Self::Plain(text) | Self::Rich { definition: text } => text,
        }
    }
}

/// Wiktionary definitions rendered as a bullet list.
#[derive(Debug, Clone)]
pub struct WiktionaryProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl WiktionaryProvider {
    /// Create a provider using `client` against `base_url`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl DefinitionProvider for WiktionaryProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::SecondaryOnline
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn lookup(&self, word: &str) -> Result<String> {
        let url = endpoint(&self.base_url, word, NAME)?;
        debug!(%url, "Querying wiktionary");
        let payload: HashMap<String, Vec<Bucket>> = get_json(&self.client, url, NAME).await?;
        let buckets = payload
            .get("en")
            .ok_or_else(|| Error::provider(NAME, "no English definitions"))?;
        render(buckets).ok_or_else(|| Error::provider(NAME, "empty definitions"))
    }
}

fn render(buckets: &[Bucket]) -> Option<String> {
    let lines: Vec<String> = buckets
        .iter()
        .flat_map(|bucket| bucket.definitions.iter())
        .map(|def| strip_html(def.text()).replace(['[', ']'], ""))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .take(MAX_DEFINITIONS)
        .map(|text| format!("• {text}"))
        .collect();

    (!lines.is_empty()).then(|| lines.join("\n"))
}
