//! Text comparison rules for reconciliation.

use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

use crate::config::PREFIX_EQUIVALENCE_RATIO;
use crate::normalize::{collapse_whitespace, nfc};

/// Amendment citation that only one rendering may print.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static AMENDMENT_CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:lag|law)\s*\(\d{4}:\d+\)\.?").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.;:()\-]").expect("valid regex"));

/// Body normalization: part separators become spaces, whitespace collapses.
pub(crate) fn normalize_body(text: &str) -> String {
    collapse_whitespace(&nfc(&text.replace("||", " ")))
}

/// Body normalization without amendment citations.
pub(crate) fn normalize_loose(text: &str) -> String {
    let body = normalize_body(text);
    collapse_whitespace(&AMENDMENT_CITATION.replace_all(&body, ""))
}

/// Loose normalization without punctuation, lowercased.
fn normalize_format(text: &str) -> String {
    let loose = normalize_loose(text);
    collapse_whitespace(&PUNCTUATION.replace_all(&loose, "")).to_lowercase()
}

/// Marker or version identity for comparison: collapsed and lowercased.
pub(crate) fn normalize_marker(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Chapter and paragraph ids compare without whitespace ("2 a" is "2a").
pub(crate) fn normalize_id(id: &str) -> String {
    id.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Same text, possibly up to amendment citations or a short tail.
pub(crate) fn equivalent_text(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a = normalize_loose(a);
    let b = normalize_loose(b);
    if a == b {
        return true;
    }
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (&a, &b)
    } else {
        (&b, &a)
    };
    let ratio = shorter.chars().count() as f64 / longer.chars().count() as f64;
    longer.starts_with(shorter.as_str()) && ratio > PREFIX_EQUIVALENCE_RATIO
}

/// Same words, differing only in punctuation or case.
pub(crate) fn format_equivalent(a: &str, b: &str) -> bool {
    normalize_format(a) == normalize_format(b)
}

fn leading_number(id: &str) -> u64 {
    let digits: String = id.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(u64::MAX)
}

/// Numeric order by leading number, then lexical ("2" < "2a" < "10").
/// Ids without a leading number sort last.
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    leading_number(a)
        .cmp(&leading_number(b))
        .then_with(|| a.cmp(b))
}
