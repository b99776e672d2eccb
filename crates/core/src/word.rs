//! Word extraction, validation and lemma candidates.

use regex::Regex;
use std::sync::LazyLock;

/// Longest accepted word, in bytes.
pub const MAX_WORD_LEN: usize = 64;

#[allow(clippy::unwrap_used)]
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\-']+$").unwrap());

/// Characters stripped from both ends of a captured selection.
const TRIM_CHARS: &[char] = &[
    ' ', '\t', '\r', '\n', '"', '“', '”', '‘', '’', '.', ',', ';', ':', '!', '?', '(', ')', '[',
    ']', '{', '}',
];

/// Extract the first word from raw input (a selection, argv, or socket payload).
///
/// Only the first line is considered. Surrounding quotes and punctuation are
/// removed before splitting on whitespace.
#[must_use]
pub fn pick_word(raw: &str) -> String {
    let first_line = raw.trim().lines().next().unwrap_or_default();
    first_line
        .trim_matches(TRIM_CHARS)
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Whether `word` is an acceptable lookup token.
#[must_use]
pub fn valid_word(word: &str) -> bool {
    !word.is_empty() && word.len() <= MAX_WORD_LEN && WORD_RE.is_match(word)
}

/// Lowercased cache key for a surface word.
#[must_use]
pub fn normalize_key(word: &str) -> String {
    word.to_lowercase()
}

/// Candidate base forms for `word`, most specific first.
///
/// The lowercased word itself always comes first. An `-ies` word then yields
/// only its `-y` singular; otherwise an `-es` strip and an `-s` strip follow
/// where they apply. Words ending in `ss` never lose their final `s`.
/// Duplicates are removed while preserving order.
#[must_use]
pub fn lemmas(word: &str) -> Vec<String> {
    let w = word.to_lowercase();
    let len = w.chars().count();
    let mut candidates = vec![w.clone()];

    if len > 4
        && let Some(stem) = w.strip_suffix("ies")
    {
        candidates.push(format!("{stem}y"));
    } else {
        if len > 4
            && let Some(stem) = w.strip_suffix("es")
        {
            candidates.push(stem.to_string());
        }
        if len > 3
            && !w.ends_with("ss")
            && let Some(stem) = w.strip_suffix('s')
        {
            candidates.push(stem.to_string());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !out.contains(&candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Uppercase the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
