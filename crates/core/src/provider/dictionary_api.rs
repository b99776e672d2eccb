//! Primary remote provider backed by the free dictionary API.

use super::DefinitionProvider;
use super::http::{endpoint, get_json};
use crate::entry::SourceKind;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Write;
use std::time::Duration;
use tracing::debug;

/// Default endpoint; the word is appended as the last path segment.
pub const DEFAULT_BASE_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

/// Parts of speech rendered per definition.
const MAX_MEANINGS: usize = 3;

const NAME: &str = "dictionaryapi";

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(default, rename = "partOfSpeech")]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<Sense>,
}

#[derive(Debug, Deserialize)]
struct Sense {
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example: Option<String>,
}

/// Structured dictionary service grouping senses by part of speech.
#[derive(Debug, Clone)]
pub struct DictionaryApiProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl DictionaryApiProvider {
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
impl DefinitionProvider for DictionaryApiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Online
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn lookup(&self, word: &str) -> Result<String> {
        let url = endpoint(&self.base_url, word, NAME)?;
        debug!(%url, "Querying primary dictionary");
        let entries: Vec<Entry> = get_json(&self.client, url, NAME).await?;
        render(&entries).ok_or_else(|| Error::provider(NAME, "no meanings"))
    }
}

/// First definition (and example) of up to three parts of speech from the
/// first entry, separated by blank lines.
fn render(entries: &[Entry]) -> Option<String> {
    let first = entries.first()?;
    let mut out = String::new();
    let mut added = 0;

    for meaning in &first.meanings {
        let Some(sense) = meaning.definitions.first() else {
            continue;
        };
        if added > 0 {
            out.push_str("\n\n");
        }
        if !meaning.part_of_speech.is_empty() {
            out.push_str(&meaning.part_of_speech);
            out.push('\n');
        }
        out.push_str(&sense.definition);
        if let Some(example) = sense.example.as_deref().filter(|e| !e.is_empty()) {
            let _ = write!(out, "\nExample: {example}");
        }
        added += 1;
        if added >= MAX_MEANINGS {
            break;
        }
    }

    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}
