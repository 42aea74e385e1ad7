//! Configuration constants and validation functions for the statute reader.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, StatuteError};

/// Law name used when the caller does not supply one.
pub const DEFAULT_LAW_NAME: &str = "Unnamed statute";

/// Law identifier used when the caller does not supply one.
pub const DEFAULT_LAW_ID: &str = "unknown";

/// Class carried by the table-of-contents container in the markup rendering.
///
/// Containers with this class are never treated as statute content.
pub const TOC_CLASS: &str = "sfstoc";

/// Class that marks an anchor as the start of a paragraph.
pub const PARAGRAPH_ANCHOR_CLASS: &str = "paragraf";

/// Maximum characters of body text quoted in a reconciliation finding.
pub const FINDING_SNIPPET_WIDTH: usize = 80;

/// Maximum characters of body text quoted in log lines.
pub const LOG_SNIPPET_WIDTH: usize = 120;

/// Length ratio above which a prefix match counts as the same body.
///
/// Covers trailing amendment references that only one rendering prints.
pub const PREFIX_EQUIVALENCE_RATIO: f64 = 0.95;

/// Headings that open the transitional provisions of a statute.
pub const TRANSITIONAL_HEADINGS: &[&str] = &["Övergångsbestämmelser", "Transitional provisions"];

/// Division fabricated for paragraphs that appear before any chapter.
pub const AUTO_DIVISION_ID: &str = "A";
pub const AUTO_DIVISION_NAME: &str = "AUTO";

/// Chapter fabricated for paragraphs that appear before any chapter.
pub const AUTO_CHAPTER_ID: &str = "1";
pub const AUTO_CHAPTER_NAME: &str = "Auto-generated chapter";

/// Prefix of transitional chapter identifiers ("Ö1", "Ö2", ...).
pub const TRANSITIONAL_CHAPTER_PREFIX: &str = "Ö";

/// Date pattern: YYYY-MM-DD.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Validate and parse a date given as YYYY-MM-DD.
///
/// Unlike markers found in statute text, dates supplied by a caller must be
/// well-formed; there is no tolerant fallback.
///
/// # Arguments
/// * `date_str` - Date string to validate
///
/// # Returns
/// * `Ok(NaiveDate)` if the format is right and the date exists
/// * `Err(StatuteError::InvalidDate)` otherwise
///
/// # Examples
/// ```
/// use statute_reader::config::validate_date;
///
/// assert!(validate_date("2028-07-01").is_ok());
/// assert!(validate_date("invalid").is_err());
/// assert!(validate_date("2028-13-01").is_err()); // Invalid month
/// ```
pub fn validate_date(date_str: &str) -> Result<NaiveDate> {
    if !DATE_PATTERN.is_match(date_str) {
        return Err(StatuteError::InvalidDate(date_str.to_string()));
    }

    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| StatuteError::InvalidDate(date_str.to_string()))
}

/// Whether a whole line is one of the transitional provisions headings.
///
/// Comparison ignores case and surrounding whitespace.
#[must_use]
pub fn is_transitional_heading(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    TRANSITIONAL_HEADINGS
        .iter()
        .any(|heading| heading.to_lowercase() == line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_date_valid() {
        assert_eq!(
            validate_date("2028-07-01").ok(),
            NaiveDate::from_ymd_opt(2028, 7, 1)
        );
        assert!(validate_date("2024-02-29").is_ok()); // Leap year
    }

    #[test]
    fn test_validate_date_invalid() {
        assert!(validate_date("").is_err());
        assert!(validate_date("2028/07/01").is_err());
        assert!(validate_date("01-07-2028").is_err());
        assert!(validate_date("2028-7-1").is_err());
        assert!(validate_date("2023-02-29").is_err()); // Not a leap year
        assert!(validate_date("2028-06-31").is_err());
    }

    #[test]
    fn test_transitional_heading() {
        assert!(is_transitional_heading("Övergångsbestämmelser"));
        assert!(is_transitional_heading("  ÖVERGÅNGSBESTÄMMELSER "));
        assert!(is_transitional_heading("Transitional provisions"));
        assert!(!is_transitional_heading("Övergångsbestämmelser till 3 kap."));
        assert!(!is_transitional_heading("1 §"));
    }
}
