//! Plain-text normalization shared by every provider.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Trim, collapse whitespace inside lines, and squeeze blank-line runs.
///
/// Leading and trailing blank lines are dropped; any run of blank lines in
/// between becomes a single empty line.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for line in raw.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(collapsed);
    }

    lines.join("\n")
}

/// Remove HTML tags and decode the handful of entities dictionary APIs emit.
#[must_use]
pub fn strip_html(raw: &str) -> String {
    HTML_TAG_RE
        .replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  a   story\t told  "), "a story told");
    }

    #[test]
    fn test_normalize_squeezes_blank_lines() {
        let raw = "\n\nnoun\n  a story  \n\n\n   \nverb\nto tell\n\n";
        assert_eq!(normalize_text(raw), "noun\na story\n\nverb\nto tell");
    }

    #[test]
    fn test_normalize_blank_input() {
        assert_eq!(normalize_text(" \n\t\n "), "");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("A <a href=\"/wiki/story\">story</a> &amp; a <i>myth</i>"),
            "A story & a myth"
        );
    }
}
