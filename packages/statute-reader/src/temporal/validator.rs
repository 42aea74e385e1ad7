//! Marker validation.

use serde::Serialize;
use std::fmt;

use super::location_key;
use crate::config::FINDING_SNIPPET_WIDTH;
use crate::marker::contains_inline_marker;
use crate::model::{Law, Paragraph};
use crate::normalize::snippet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkerFindingType {
    #[serde(rename = "paragraph_periodisering_invalid")]
    Invalid,
    #[serde(rename = "paragraph_periodisering_unresolved")]
    Unresolved,
    #[serde(rename = "inline_periodisering_marker_in_text")]
    InlineInText,
}

impl MarkerFindingType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MarkerFindingType::Invalid => "paragraph_periodisering_invalid",
            MarkerFindingType::Unresolved => "paragraph_periodisering_unresolved",
            MarkerFindingType::InlineInText => "inline_periodisering_marker_in_text",
        }
    }
}

impl fmt::Display for MarkerFindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerFinding {
    /// `{type}:{location}`, stable across runs.
    pub key: String,
    #[serde(rename = "type")]
    pub finding_type: MarkerFindingType,
    pub location: String,
    /// Part holding the offending line, for inline-marker findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<usize>,
    pub message: String,
}

impl MarkerFinding {
    fn new(finding_type: MarkerFindingType, location: &str, message: String) -> Self {
        Self {
            key: format!("{finding_type}:{location}"),
            finding_type,
            location: location.to_string(),
            part: None,
            message,
        }
    }

    fn in_part(mut self, part: usize) -> Self {
        self.part = Some(part);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub invalid_count: usize,
    pub unresolved_count: usize,
    pub inline_in_text_count: usize,
    pub findings: Vec<MarkerFinding>,
}

impl ValidationReport {
    fn push(&mut self, finding: MarkerFinding) {
        match finding.finding_type {
            MarkerFindingType::Invalid => self.invalid_count += 1,
            MarkerFindingType::Unresolved => self.unresolved_count += 1,
            MarkerFindingType::InlineInText => self.inline_in_text_count += 1,
        }
        self.findings.push(finding);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Report every paragraph variant whose marker is invalid or unresolved,
/// and every variant whose body still contains a slash-wrapped marker.
///
/// A variant yields at most one inline-marker finding.
#[must_use]
pub fn validate_markers(law: &Law) -> ValidationReport {
    let mut report = ValidationReport::default();
    for chapter in law.chapters() {
        for paragraph in &chapter.paragraphs {
            check_paragraph(&location_key(&chapter.id, &paragraph.id), paragraph, &mut report);
        }
    }
    tracing::info!(
        invalid = report.invalid_count,
        unresolved = report.unresolved_count,
        inline = report.inline_in_text_count,
        "Validated markers"
    );
    report
}

fn check_paragraph(location: &str, paragraph: &Paragraph, report: &mut ValidationReport) {
    let status = paragraph.marker_status();
    let marker = paragraph.marker.as_deref().unwrap_or_default();
    if status.is_invalid() {
        report.push(MarkerFinding::new(
            MarkerFindingType::Invalid,
            location,
            format!("Invalid marker: {marker}"),
        ));
    } else if status.is_unresolved() {
        report.push(MarkerFinding::new(
            MarkerFindingType::Unresolved,
            location,
            format!("Marker without a concrete date: {marker}"),
        ));
    }

    let inline = paragraph.parts.iter().find_map(|part| {
        part.lines
            .iter()
            .find(|line| contains_inline_marker(line))
            .map(|line| (part.number, line))
    });
    if let Some((part, line)) = inline {
        report.push(
            MarkerFinding::new(
                MarkerFindingType::InlineInText,
                location,
                format!(
                    "Marker inside body text (part {part}): {}",
                    snippet(line, FINDING_SNIPPET_WIDTH)
                ),
            )
            .in_part(part),
        );
    }
}
