//! Paragraphs and their version metadata.

use chrono::NaiveDate;
use serde::Serialize;

use super::part::Part;
use super::Heading;
use crate::marker::{parse_marker, MarkerKind, MarkerStatus};

/// How the marker of a paragraph variant was classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VersionStatus {
    /// No marker; the only version of the paragraph.
    #[default]
    Untagged,
    /// Marker with a concrete date.
    Dated,
    /// Marker waiting for a decision ("den dag som regeringen bestämmer").
    Unresolved,
    /// Marker that could not be parsed.
    Invalid,
}

/// A numbered paragraph ("§"). Several variants of the same number may
/// coexist in a chapter, told apart by their markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    pub version_status: VersionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_kind: Option<MarkerKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subheading: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<String>,
    pub parts: Vec<Part>,
}

impl Paragraph {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Set the marker and derive the version metadata from it.
    ///
    /// Blank markers clear the metadata.
    pub fn set_marker(&mut self, raw: &str) {
        let raw = raw.trim();
        let status = parse_marker(Some(raw));
        self.marker = (!raw.is_empty()).then(|| raw.to_string());
        self.version_kind = status.kind();
        self.version_date = status.date();
        self.version_status = match &status {
            MarkerStatus::None => VersionStatus::Untagged,
            MarkerStatus::ValidDated { .. } => VersionStatus::Dated,
            MarkerStatus::ValidRelative { .. } => VersionStatus::Unresolved,
            MarkerStatus::Invalid { .. } => VersionStatus::Invalid,
        };
        self.version_identity = match &status {
            MarkerStatus::None => None,
            MarkerStatus::ValidDated { kind, date } => Some(format!("{}:{date}", kind.code())),
            MarkerStatus::ValidRelative { kind, tail } => Some(format!("{}:{tail}", kind.code())),
            MarkerStatus::Invalid { .. } => Some(raw.to_string()),
        };
    }

    /// Marker status, parsed again from the raw marker.
    #[must_use]
    pub fn marker_status(&self) -> MarkerStatus {
        parse_marker(self.marker.as_deref())
    }

    /// Take over the heading and sub-heading collected by the chapter.
    pub(crate) fn apply_headings(&mut self, headings: &[Heading]) {
        self.heading = headings.first().map(|h| h.title.clone());
        self.subheading = if headings.len() > 1 {
            headings.last().map(|h| h.title.clone())
        } else {
            None
        };
    }

    pub fn add_citation(&mut self, citation: impl Into<String>) {
        self.citations.push(citation.into());
    }

    /// Open the next part and return its index.
    ///
    /// Text held back by the current last part moves into the new one.
    pub fn start_next_part(&mut self) -> usize {
        let part = match self.parts.last_mut() {
            Some(previous) => Part::following(previous),
            None => Part::new(1),
        };
        self.parts.push(part);
        self.parts.len() - 1
    }

    /// No part with body text yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(Part::is_empty)
    }

    /// All body text, parts separated by " || ".
    ///
    /// # Examples
    /// ```
    /// use statute_reader::model::Paragraph;
    ///
    /// let mut paragraph = Paragraph::new("1");
    /// let first = paragraph.start_next_part();
    /// paragraph.parts[first].add_line("Första stycket.");
    /// let second = paragraph.start_next_part();
    /// paragraph.parts[second].add_line("Andra stycket.");
    /// assert_eq!(paragraph.flattened_text(), "Första stycket. || Andra stycket.");
    /// ```
    #[must_use]
    pub fn flattened_text(&self) -> String {
        self.parts
            .iter()
            .map(Part::joined)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" || ")
    }

    /// Settle held text, drop empty parts and renumber the rest.
    pub fn prune(&mut self) {
        let mut index = 0;
        while index < self.parts.len() {
            if self.parts[index].has_held_text() {
                tracing::warn!(
                    paragraph = %self.id,
                    part = self.parts[index].number,
                    "Held text at end of paragraph, moved to a new part"
                );
                let next = Part::following(&mut self.parts[index]);
                self.parts.insert(index + 1, next);
            }
            index += 1;
        }

        for part in &mut self.parts {
            part.prune();
        }
        self.parts.retain(|part| !part.is_empty());
        for (index, part) in self.parts.iter_mut().enumerate() {
            part.number = index + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_trims_id() {
        assert_eq!(Paragraph::new(" 3 a ").id, "3 a");
    }

    #[test]
    fn test_version_metadata_dated() {
        let mut paragraph = Paragraph::new("13");
        paragraph.set_marker(" Upphör att gälla U:2028-07-01 ");
        assert_eq!(paragraph.marker.as_deref(), Some("Upphör att gälla U:2028-07-01"));
        assert_eq!(paragraph.version_status, VersionStatus::Dated);
        assert_eq!(paragraph.version_kind, Some(MarkerKind::Ceases));
        assert_eq!(paragraph.version_date, NaiveDate::from_ymd_opt(2028, 7, 1));
        assert_eq!(paragraph.version_identity.as_deref(), Some("U:2028-07-01"));
    }

    #[test]
    fn test_version_metadata_relative() {
        let mut paragraph = Paragraph::new("13");
        paragraph.set_marker("Träder i kraft I:den dag som regeringen bestämmer");
        assert_eq!(paragraph.version_status, VersionStatus::Unresolved);
        assert_eq!(
            paragraph.version_identity.as_deref(),
            Some("I:den dag som regeringen bestämmer")
        );
    }

    #[test]
    fn test_version_metadata_invalid() {
        let mut paragraph = Paragraph::new("13");
        paragraph.set_marker("Träder i kraft U:2028-07-01");
        assert_eq!(paragraph.version_status, VersionStatus::Invalid);
        assert_eq!(paragraph.version_kind, Some(MarkerKind::Enters));
        assert_eq!(paragraph.version_date, None);
        assert_eq!(
            paragraph.version_identity.as_deref(),
            Some("Träder i kraft U:2028-07-01")
        );
    }

    #[test]
    fn test_blank_marker_clears_metadata() {
        let mut paragraph = Paragraph::new("1");
        paragraph.set_marker("Träder i kraft I:2028-07-01");
        paragraph.set_marker("  ");
        assert_eq!(paragraph.marker, None);
        assert_eq!(paragraph.version_status, VersionStatus::Untagged);
        assert_eq!(paragraph.version_identity, None);
    }

    #[test]
    fn test_headings() {
        let mut paragraph = Paragraph::new("1");
        paragraph.apply_headings(&[Heading::new("Tillämpning"), Heading::new("Undantag")]);
        assert_eq!(paragraph.heading.as_deref(), Some("Tillämpning"));
        assert_eq!(paragraph.subheading.as_deref(), Some("Undantag"));

        paragraph.apply_headings(&[Heading::new("Ensam")]);
        assert_eq!(paragraph.heading.as_deref(), Some("Ensam"));
        assert_eq!(paragraph.subheading, None);
    }

    #[test]
    fn test_prune_materializes_held_text_and_renumbers() {
        let mut paragraph = Paragraph::new("5");
        let empty = paragraph.start_next_part();
        assert_eq!(empty, 0);
        let second = paragraph.start_next_part();
        paragraph.parts[second].add_line("1. punkt");
        paragraph.parts[second].add_line("Avslutande mening.");

        paragraph.prune();

        assert_eq!(paragraph.parts.len(), 2);
        assert_eq!(paragraph.parts[0].number, 1);
        assert_eq!(paragraph.parts[0].lines, vec!["1. punkt"]);
        assert_eq!(paragraph.parts[1].number, 2);
        assert_eq!(paragraph.parts[1].lines, vec!["Avslutande mening."]);
    }

    #[test]
    fn test_is_empty_ignores_empty_parts() {
        let mut paragraph = Paragraph::new("1");
        assert!(paragraph.is_empty());
        paragraph.start_next_part();
        assert!(paragraph.is_empty());
        paragraph.parts[0].add_line("text");
        assert!(!paragraph.is_empty());
    }
}
