//! Text clean-up shared by every lookup stage.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

/// Longest description handed back to callers, in characters.
pub const MAX_DESC_CHARS: usize = 400;

/// Bracketed citation markers such as `[1]` or `[citation needed]`.
static CITATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("Invalid citation regex"));

/// Canonical lookup key: entities decoded, lower-cased, whitespace collapsed and trimmed.
pub fn normalize_key(s: &str) -> String {
    let decoded = decode_entities(s);
    decoded
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace and drop citation markers. Case is preserved.
pub fn clean_text(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    CITATION_REGEX
        .replace_all(s, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `n` sentences of `text`, always ending with a period.
///
/// Sentences are split on `". "`, so abbreviations can end a sentence early.
pub fn first_sentences(text: &str, n: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut out = text
        .split(". ")
        .take(n)
        .collect::<Vec<_>>()
        .join(". ")
        .trim()
        .to_string();
    if !out.ends_with('.') {
        out.push('.');
    }
    out
}

/// Limit a description to [`MAX_DESC_CHARS`] characters, keeping the terminal period.
pub fn clip_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESC_CHARS {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(MAX_DESC_CHARS - 1).collect();
    let trimmed_len = clipped
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .len();
    clipped.truncate(trimmed_len);
    clipped.push('.');
    clipped
}

/// Two sentences, clipped. Every description leaving a stage goes through here.
pub fn finish_description(text: &str) -> String {
    clip_description(&first_sentences(text, 2))
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let fragment = Html::parse_fragment(s);
    fragment.root_element().text().collect()
}
