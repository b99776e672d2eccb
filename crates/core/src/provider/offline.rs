//! Offline provider wrapping a local `dict` client.

use super::DefinitionProvider;
use crate::entry::SourceKind;
use crate::{Error, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Default dictionary client.
pub const DEFAULT_PROGRAM: &str = "dict";
/// Default local database queried first.
pub const DEFAULT_DATABASE: &str = "gcide";

/// Lines kept from a cleaned definition.
const MAX_LINES: usize = 48;

const NAME: &str = "dict";

const NO_DEFINITION_MARKERS: &[&str] = &["No definitions found for", "perhaps you mean"];

#[allow(clippy::unwrap_used)]
static BRACKET_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\[[^\]]+\]").unwrap());
#[allow(clippy::unwrap_used)]
static DB_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+:\s+.+$").unwrap());

/// Local dictionary lookups through a `dict`-compatible command.
///
/// The named database is queried first; if that invocation fails, every
/// configured database is queried instead.
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    program: PathBuf,
    database: String,
    command_timeout: Duration,
}

impl OfflineProvider {
    /// Create a provider invoking `program` against `database`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>, database: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            database: database.into(),
            command_timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = timeout(self.command_timeout, cmd.output())
            .await
            .map_err(|_| Error::timeout(format!("{} {}", self.program.display(), args.join(" ")), self.command_timeout))?
            .map_err(|e| Error::provider(NAME, format!("failed to run {}: {e}", self.program.display())))?;

        if !output.status.success() {
            return Err(Error::provider(NAME, format!("exited with {}", output.status)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DefinitionProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn source_kind(&self) -> SourceKind {
        SourceKind::Offline
    }

    fn timeout(&self) -> Duration {
        // Primary invocation plus the fallback
        self.command_timeout * 2 + Duration::from_millis(20)
    }

    async fn lookup(&self, word: &str) -> Result<String> {
        let raw = match self.run(&["-d", &self.database, word]).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(error = %e, database = %self.database, "Database lookup failed, querying all databases");
                self.run(&[word]).await?
            }
        };

        clean_output(&raw).ok_or_else(|| Error::provider(NAME, "no usable definition"))
    }
}

/// Extract the definition prose from raw `dict` output.
///
/// Returns `None` when the output says nothing was found or nothing
/// definition-like survives filtering.
#[must_use]
pub fn clean_output(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || NO_DEFINITION_MARKERS.iter().any(|m| raw.contains(m)) {
        return None;
    }

    let mut clean: Vec<String> = Vec::with_capacity(MAX_LINES);
    let mut started = false;
    let mut prev_blank = false;

    for line in raw.lines() {
        let trimmed = line.trim();

        if is_banner(line) || trimmed == "." {
            continue;
        }
        if clean.is_empty() && DB_HEADER_RE.is_match(trimmed) {
            continue;
        }
        if trimmed.is_empty() {
            if started && !prev_blank && !clean.is_empty() {
                clean.push(String::new());
                prev_blank = true;
            }
            continue;
        }

        let normalized = normalize_line(trimmed);
        if normalized.is_empty() {
            continue;
        }
        if !started {
            if !looks_like_definition(&normalized) {
                continue;
            }
            started = true;
        }

        clean.push(normalized);
        prev_blank = false;
        if clean.len() >= MAX_LINES {
            break;
        }
    }

    let out = clean.join("\n");
    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}

fn is_banner(line: &str) -> bool {
    line.starts_with("From ")
        || line.starts_with("Database")
        || line.contains("definition found")
        || line.contains("definitions found")
        || line.starts_with("Copyright")
        || line.starts_with("dictd")
        || line.starts_with("----")
}

fn looks_like_definition(line: &str) -> bool {
    ["1.", "2.", "The ", "A ", "An "]
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

fn normalize_line(line: &str) -> String {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    BRACKET_TAG_RE.replace_all(&collapsed, "").trim().to_string()
}
