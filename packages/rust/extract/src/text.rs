//! Text normalization shared by headings, prose fragments and table cells.

use std::sync::LazyLock;

use regex::Regex;

const ZERO_WIDTH_SPACE: char = '\u{200b}';

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Join the prose fragments of one scope into its `info` text.
///
/// Fragments are joined with a single space, newlines are removed and runs
/// of spaces collapse to one. An empty result is `None`.
pub fn join_fragments<S: AsRef<str>>(fragments: &[S]) -> Option<String> {
    let joined = fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\n', "")
        .replace(ZERO_WIDTH_SPACE, "");

    let collapsed = MULTI_SPACE_RE.replace_all(&joined, " ");
    let trimmed = collapsed.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalize a heading or caption: zero-width spaces removed, every
/// whitespace run collapsed to one space, ends trimmed.
pub fn clean_inline(text: &str) -> String {
    let stripped = text.replace(ZERO_WIDTH_SPACE, "");
    WHITESPACE_RE.replace_all(&stripped, " ").trim().to_string()
}

/// Normalize a table cell: zero-width spaces removed, runs of 2+ spaces
/// collapsed to one, ends trimmed. Line breaks inside the cell are kept.
pub fn clean_cell(text: &str) -> String {
    let stripped = text.replace(ZERO_WIDTH_SPACE, "");
    MULTI_SPACE_RE.replace_all(&stripped, " ").trim().to_string()
}
