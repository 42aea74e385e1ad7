//! Reconciliation findings and the result that collects them.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Structural,
    Content,
    FormatOnly,
}

/// Kind of disagreement between the two renderings.
///
/// The string form is part of every finding key, so it must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    ChapterMissingHtml,
    ChapterMissingText,
    ParagraphMissingHtml,
    ParagraphMissingText,
    ParagraphVariantCount,
    ParagraphPeriodiseringInvalid,
    ParagraphPeriodiseringUnresolved,
    ParagraphPeriodiseringMismatch,
    ParagraphEmptyHtml,
    ParagraphTextFormatOnly,
    ParagraphTextMismatch,
}

impl FindingType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FindingType::ChapterMissingHtml => "chapter_missing_html",
            FindingType::ChapterMissingText => "chapter_missing_text",
            FindingType::ParagraphMissingHtml => "paragraph_missing_html",
            FindingType::ParagraphMissingText => "paragraph_missing_text",
            FindingType::ParagraphVariantCount => "paragraph_variant_count",
            FindingType::ParagraphPeriodiseringInvalid => "paragraph_periodisering_invalid",
            FindingType::ParagraphPeriodiseringUnresolved => "paragraph_periodisering_unresolved",
            FindingType::ParagraphPeriodiseringMismatch => "paragraph_periodisering_mismatch",
            FindingType::ParagraphEmptyHtml => "paragraph_empty_html",
            FindingType::ParagraphTextFormatOnly => "paragraph_text_format_only",
            FindingType::ParagraphTextMismatch => "paragraph_text_mismatch",
        }
    }

    /// Severity and category every finding of this type carries.
    #[must_use]
    pub fn classification(self) -> (Severity, Category) {
        match self {
            FindingType::ChapterMissingHtml
            | FindingType::ChapterMissingText
            | FindingType::ParagraphMissingHtml
            | FindingType::ParagraphMissingText
            | FindingType::ParagraphVariantCount => (Severity::High, Category::Structural),
            FindingType::ParagraphPeriodiseringInvalid
            | FindingType::ParagraphPeriodiseringMismatch => (Severity::Medium, Category::Structural),
            FindingType::ParagraphPeriodiseringUnresolved => (Severity::Low, Category::Structural),
            FindingType::ParagraphEmptyHtml | FindingType::ParagraphTextMismatch => {
                (Severity::Medium, Category::Content)
            }
            FindingType::ParagraphTextFormatOnly => (Severity::Low, Category::FormatOnly),
        }
    }
}

impl fmt::Display for FindingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One disagreement between the markup and plain-text renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// `{type}:{location}`, stable across runs; used by allow-lists.
    pub key: String,
    #[serde(rename = "type")]
    pub finding_type: FindingType,
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup_marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_marker: Option<String>,
}

impl Finding {
    #[must_use]
    pub fn new(finding_type: FindingType, location: &str, message: impl Into<String>) -> Self {
        let (severity, category) = finding_type.classification();
        Self {
            key: format!("{finding_type}:{location}"),
            finding_type,
            severity,
            category,
            message: message.into(),
            markup_marker: None,
            text_marker: None,
        }
    }

    #[must_use]
    pub fn with_markers(mut self, markup: Option<String>, text: Option<String>) -> Self {
        self.markup_marker = markup;
        self.text_marker = text;
        self
    }
}

/// All findings of one reconciliation, with counts per type and severity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub finding_count: usize,
    pub by_type: BTreeMap<FindingType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub findings: Vec<Finding>,
}

impl ReconciliationResult {
    pub(crate) fn push(&mut self, finding: Finding) {
        *self.by_type.entry(finding.finding_type).or_default() += 1;
        *self.by_severity.entry(finding.severity).or_default() += 1;
        self.findings.push(finding);
        self.finding_count = self.findings.len();
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// The same result without findings whose key is allowed.
    ///
    /// # Examples
    /// ```
    /// use std::collections::HashSet;
    /// use statute_reader::reconcile::{Finding, FindingType, ReconciliationResult};
    ///
    /// let mut result = ReconciliationResult::default();
    /// result = result.with(Finding::new(FindingType::ParagraphTextMismatch, "K1 P1#V1", "differs"));
    /// let allowed: HashSet<String> = ["paragraph_text_mismatch:K1 P1#V1".to_string()].into();
    /// assert!(result.without_allowed(&allowed).is_clean());
    /// ```
    #[must_use]
    pub fn without_allowed(&self, allowed: &HashSet<String>) -> Self {
        self.findings
            .iter()
            .filter(|finding| !allowed.contains(&finding.key))
            .cloned()
            .fold(Self::default(), Self::with)
    }

    /// Add a finding, builder style.
    #[must_use]
    pub fn with(mut self, finding: Finding) -> Self {
        self.push(finding);
        self
    }

    /// Plain-text report: totals, counts per severity and type, then one
    /// line per finding.
    #[must_use]
    pub fn as_text(&self) -> String {
        let mut out = String::from("Reconciliation report\n");
        out.push_str(&format!("Findings: {}\n\n", self.finding_count));

        if !self.by_severity.is_empty() {
            out.push_str("Summary by severity:\n");
            for (severity, count) in &self.by_severity {
                out.push_str(&format!("- {severity}: {count}\n"));
            }
            out.push('\n');
        }

        if !self.by_type.is_empty() {
            out.push_str("Summary by type:\n");
            for (finding_type, count) in &self.by_type {
                out.push_str(&format!("- {finding_type}: {count}\n"));
            }
            out.push('\n');
        }

        for finding in &self.findings {
            out.push_str(&format!(
                "- [{}] {} key={} :: {}\n",
                finding.severity, finding.finding_type, finding.key, finding.message
            ));
        }
        out
    }
}
