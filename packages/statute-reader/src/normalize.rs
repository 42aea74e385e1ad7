//! Text normalization shared by the extractors and the reconciler.

use unicode_normalization::UnicodeNormalization;

/// Collapse every whitespace run (non-breaking spaces included) to a single
/// space and trim the ends.
///
/// # Examples
/// ```
/// use statute_reader::normalize::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  1\u{a0}\u{a0}a  kap. "), "1 a kap.");
/// ```
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a chapter or paragraph number token ("2\u{a0}a" becomes "2 a").
#[must_use]
pub fn normalize_number_token(token: &str) -> String {
    collapse_whitespace(token)
}

/// Canonical composition, so that "a\u{308}" and "ä" compare equal.
#[must_use]
pub fn nfc(text: &str) -> String {
    text.nfc().collect()
}

/// Take at most `width` characters, marking a cut with "...".
#[must_use]
pub fn snippet(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a \t b\n\nc"), "a b c");
        assert_eq!(collapse_whitespace("\u{a0}x\u{a0}"), "x");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn test_normalize_number_token() {
        assert_eq!(normalize_number_token("2\u{a0}a"), "2 a");
        assert_eq!(normalize_number_token("12"), "12");
    }

    #[test]
    fn test_nfc_composes() {
        assert_eq!(nfc("a\u{308}r"), "är");
    }

    #[test]
    fn test_snippet_cuts_on_characters() {
        assert_eq!(snippet("åäö", 5), "åäö");
        assert_eq!(snippet("åäöåäö", 3), "åäö...");
    }
}
