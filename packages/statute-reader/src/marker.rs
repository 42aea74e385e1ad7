//! Effective-date markers.
//!
//! A marker is a short annotation on a paragraph variant saying when that
//! version enters into force or ceases to apply, e.g.
//! `Träder i kraft I:2028-07-01` or `Upphör att gälla U:den dag som regeringen
//! bestämmer`. The verb and the single-letter code must agree: `I` goes with
//! entering into force, `U` with ceasing. Both Swedish and English verbs are
//! accepted.
//!
//! Parsing never fails. Anything that is not a well-formed marker is reported
//! as [`MarkerStatus::Invalid`] so that callers can surface it as a finding.

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Verb, code and tail of a marker.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(upphör att gälla|träder i kraft|ceases to apply|enters into force)\s+([UI]):\s*(.*)$",
    )
    .expect("valid regex")
});

/// First ISO date anywhere in a marker tail.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static TAIL_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("valid regex"));

/// A marker left inside body text, still wrapped in slashes.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)/(?:upphör att gälla|träder i kraft|ceases to apply|enters into force)\s+[UI]:[^/]+/",
    )
    .expect("valid regex")
});

/// A text run that is nothing but a slash-wrapped marker.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static BRACKETED_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(.+)/$").expect("valid regex"));

/// A slash-wrapped marker at the start of a line, followed by body text.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/(.+?)/\s*(.*)$").expect("valid regex"));

/// Direction of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// The variant enters into force on the marker date (code `I`).
    Enters,
    /// The variant ceases to apply on the marker date (code `U`).
    Ceases,
}

impl MarkerKind {
    /// Single-letter code used in statute text.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            MarkerKind::Enters => "I",
            MarkerKind::Ceases => "U",
        }
    }

    fn from_verb(verb: &str) -> Self {
        let verb = verb.to_lowercase();
        if verb.starts_with("upphör") || verb.starts_with("ceases") {
            MarkerKind::Ceases
        } else {
            MarkerKind::Enters
        }
    }

    fn from_code(code: &str) -> Self {
        if code.eq_ignore_ascii_case("U") {
            MarkerKind::Ceases
        } else {
            MarkerKind::Enters
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::Enters => write!(f, "enters"),
            MarkerKind::Ceases => write!(f, "ceases"),
        }
    }
}

/// Result of parsing a marker string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerStatus {
    /// No marker present.
    None,
    /// Marker with a concrete date.
    ValidDated { kind: MarkerKind, date: NaiveDate },
    /// Well-formed marker whose moment depends on a future decision.
    ValidRelative { kind: MarkerKind, tail: String },
    /// Malformed marker. The kind is kept when the verb was recognized.
    Invalid { kind: Option<MarkerKind> },
}

impl MarkerStatus {
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, MarkerStatus::Invalid { .. })
    }

    /// A well-formed marker without a concrete date.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        matches!(self, MarkerStatus::ValidRelative { .. })
    }

    #[must_use]
    pub fn kind(&self) -> Option<MarkerKind> {
        match self {
            MarkerStatus::None => None,
            MarkerStatus::ValidDated { kind, .. } | MarkerStatus::ValidRelative { kind, .. } => {
                Some(*kind)
            }
            MarkerStatus::Invalid { kind } => *kind,
        }
    }

    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            MarkerStatus::ValidDated { date, .. } => Some(*date),
            _ => None,
        }
    }

    /// Whether the marked variant applies on `date`.
    ///
    /// Only dated markers can answer. A variant that enters into force is
    /// active from its date on; a variant that ceases is active strictly
    /// before its date.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use statute_reader::marker::parse_marker;
    ///
    /// let marker = parse_marker(Some("Träder i kraft I:2028-07-01"));
    /// let day = |d| NaiveDate::from_ymd_opt(2028, 7, d).unwrap();
    /// assert_eq!(marker.is_active_on(day(1)), Some(true));
    /// assert_eq!(parse_marker(None).is_active_on(day(1)), None);
    /// ```
    #[must_use]
    pub fn is_active_on(&self, date: NaiveDate) -> Option<bool> {
        match self {
            MarkerStatus::ValidDated {
                kind: MarkerKind::Enters,
                date: marker_date,
            } => Some(date >= *marker_date),
            MarkerStatus::ValidDated {
                kind: MarkerKind::Ceases,
                date: marker_date,
            } => Some(date < *marker_date),
            _ => None,
        }
    }
}

/// Parse a marker string.
///
/// # Arguments
/// * `text` - Marker without its surrounding slashes, or `None`
///
/// # Returns
/// The classified marker. Blank input is [`MarkerStatus::None`].
///
/// # Examples
/// ```
/// use statute_reader::marker::{parse_marker, MarkerKind, MarkerStatus};
///
/// assert!(matches!(
///     parse_marker(Some("Upphör att gälla U:2028-07-01")),
///     MarkerStatus::ValidDated { kind: MarkerKind::Ceases, .. }
/// ));
/// assert!(parse_marker(Some("Träder i kraft I:den dag regeringen bestämmer")).is_unresolved());
/// assert!(parse_marker(Some("Träder i kraft U:2028-07-01")).is_invalid());
/// ```
#[must_use]
pub fn parse_marker(text: Option<&str>) -> MarkerStatus {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return MarkerStatus::None;
    };

    let Some(caps) = MARKER_PATTERN.captures(text) else {
        return MarkerStatus::Invalid { kind: None };
    };

    let kind = MarkerKind::from_verb(&caps[1]);
    let tail = caps[3].trim();
    if tail.is_empty() || MarkerKind::from_code(&caps[2]) != kind {
        return MarkerStatus::Invalid { kind: Some(kind) };
    }

    match TAIL_DATE_PATTERN.captures(tail) {
        Some(date) => match NaiveDate::parse_from_str(&date[1], "%Y-%m-%d") {
            Ok(date) => MarkerStatus::ValidDated { kind, date },
            Err(_) => MarkerStatus::Invalid { kind: Some(kind) },
        },
        None => MarkerStatus::ValidRelative {
            kind,
            tail: tail.to_string(),
        },
    }
}

/// Whether `text` still contains a slash-wrapped marker.
#[must_use]
pub fn contains_inline_marker(text: &str) -> bool {
    INLINE_PATTERN.is_match(text)
}

/// Marker carried by a text run of the form `/marker/`.
#[must_use]
pub fn bracketed_marker(text: &str) -> Option<&str> {
    BRACKETED_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split a leading `/marker/` off a line.
///
/// A slash-wrapped prefix without a marker verb and code stays body text.
///
/// # Returns
/// The marker (if any) and the remaining body text, both trimmed.
#[must_use]
pub fn split_marker_prefix(line: &str) -> (Option<String>, String) {
    match PREFIX_PATTERN.captures(line) {
        Some(caps) if parse_marker(Some(&caps[1])).kind().is_some() => {
            (Some(caps[1].trim().to_string()), caps[2].trim().to_string())
        }
        _ => (None, line.trim().to_string()),
    }
}
