//! End-to-end tests over both renderings of one statute.
//!
//! The fixtures hold the same small statute as XHTML and as plain text,
//! with two dated variants of one paragraph and one paragraph whose
//! entry into force is left to the government.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use statute_reader::reconcile::{FindingType, Severity};
use statute_reader::temporal::TransitionAction;
use statute_reader::{
    apply_effective_date, build_schedule, extract_from_text, extract_from_xhtml, reconcile,
    validate_markers, Law,
};

const LAW_NAME: &str = "Lag om försäkring";
const LAW_ID: &str = "2024:100";

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("forsakringslag")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn markup_law() -> Law {
    extract_from_xhtml(&load_fixture("content.xhtml"), LAW_NAME, LAW_ID).unwrap()
}

fn text_law_from(content: &str) -> Law {
    extract_from_text(content.lines(), LAW_NAME, LAW_ID).unwrap()
}

fn text_law() -> Law {
    text_law_from(&load_fixture("content.txt"))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_both_renderings_have_same_structure() {
    for law in [markup_law(), text_law()] {
        let chapters: Vec<_> = law.chapters().map(|c| c.id.as_str()).collect();
        assert_eq!(chapters, vec!["1", "2"]);
        assert_eq!(law.divisions.len(), 2);
        assert_eq!(law.paragraph_count(), 5);
        assert_eq!(law.find_paragraphs("1", "2").len(), 2);
    }
}

#[test]
fn test_markup_paragraph_details() {
    let law = markup_law();

    let first = law.find_paragraphs("1", "1")[0];
    assert_eq!(first.heading.as_deref(), Some("Lagens innehåll"));
    assert_eq!(first.parts.len(), 2);
    assert_eq!(
        first.flattened_text(),
        "Denna lag innehåller bestämmelser om försäkring. || Lagen gäller även för den som vistas i Sverige."
    );

    let variants = law.find_paragraphs("1", "2");
    assert_eq!(variants[0].version_identity.as_deref(), Some("U:2028-07-01"));
    assert_eq!(variants[1].version_identity.as_deref(), Some("I:2028-07-01"));
    assert_eq!(variants[1].citations, vec!["Lag (2024:512)."]);
}

#[test]
fn test_text_paragraph_details() {
    let law = text_law();

    let first = law.find_paragraphs("1", "1")[0];
    assert_eq!(first.parts.len(), 2);
    assert_eq!(first.parts[1].lines, vec!["Lagen gäller även för den som vistas i Sverige."]);

    let variants = law.find_paragraphs("1", "2");
    assert_eq!(
        variants[0].marker.as_deref(),
        Some("Upphör att gälla U:2028-07-01")
    );
    assert_eq!(
        variants[0].flattened_text(),
        "Avgiften är 100 kronor. Lag (2018:1233)."
    );
}

#[test]
fn test_identical_renderings_only_report_unresolved_marker() {
    let result = reconcile(&markup_law(), &text_law());

    assert_eq!(result.finding_count, 1);
    let finding = &result.findings[0];
    assert_eq!(finding.finding_type, FindingType::ParagraphPeriodiseringUnresolved);
    assert_eq!(finding.severity, Severity::Low);
    assert_eq!(finding.key, "paragraph_periodisering_unresolved:K2 P2#V1");

    let allowed: HashSet<String> = [finding.key.clone()].into();
    assert!(result.without_allowed(&allowed).is_clean());
}

#[test]
fn test_reconcile_detects_changed_text() {
    let content = load_fixture("content.txt")
        .replace("200 kronor", "250 kronor")
        .replace("lämnas enligt denna lag", "lämnas, enligt denna lag");
    let result = reconcile(&markup_law(), &text_law_from(&content));

    let keys: Vec<_> = result.findings.iter().map(|f| f.key.as_str()).collect();
    assert_eq!(
        keys,
        vec![
            "paragraph_text_mismatch:K1 P2#V2",
            "paragraph_text_format_only:K2 P1#V1",
            "paragraph_periodisering_unresolved:K2 P2#V1",
        ]
    );
    assert_eq!(result.by_severity[&Severity::Medium], 1);
    assert_eq!(result.by_severity[&Severity::Low], 2);
}

#[test]
fn test_reconcile_detects_missing_chapter_and_paragraph() {
    let content = load_fixture("content.txt");
    let truncated = content
        .split("AVD. B FÖRMÅNER")
        .next()
        .unwrap()
        .replace("1 § Denna lag innehåller bestämmelser om försäkring.", "");
    let result = reconcile(&markup_law(), &text_law_from(&truncated));

    let types: Vec<_> = result.findings.iter().map(|f| f.finding_type).collect();
    assert!(types.contains(&FindingType::ChapterMissingText));
    assert!(result
        .findings
        .iter()
        .any(|f| f.key == "chapter_missing_text:K2"));
    assert!(result.as_text().contains("Chapter missing in text: 2 (Förmåner)"));
}

#[test]
fn test_missing_chapter_reported_once_without_paragraph_findings() {
    let content = load_fixture("content.txt");
    let truncated = content.split("AVD. B FÖRMÅNER").next().unwrap();
    let result = reconcile(&markup_law(), &text_law_from(truncated));

    let chapter_findings: Vec<_> = result
        .findings
        .iter()
        .filter(|f| {
            matches!(
                f.finding_type,
                FindingType::ChapterMissingHtml | FindingType::ChapterMissingText
            )
        })
        .collect();
    assert_eq!(chapter_findings.len(), 1);
    assert_eq!(chapter_findings[0].severity, Severity::High);
    assert_eq!(chapter_findings[0].key, "chapter_missing_text:K2");

    assert!(!result.findings.iter().any(|f| f.key.contains(":K2 P")));
    assert_eq!(result.finding_count, 1);
}

#[test]
fn test_effective_date_before_and_after_transition() {
    let mut before = markup_law();
    let report = apply_effective_date(&mut before, date(2026, 1, 1));
    assert_eq!(report.selected_variants, 1);
    assert_eq!(report.dropped_variants, 1);
    assert_eq!(report.ambiguous_groups, 0);
    assert_eq!(report.paragraph_variants_before, 5);
    assert_eq!(report.paragraph_variants_after, 4);
    assert_eq!(
        before.find_paragraphs("1", "2")[0].flattened_text(),
        "Avgiften är 100 kronor. Lag (2018:1233)."
    );

    let mut after = text_law();
    apply_effective_date(&mut after, date(2028, 7, 1));
    let kept = after.find_paragraphs("1", "2");
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].flattened_text(), "Avgiften är 200 kronor. Lag (2024:512).");
}

#[test]
fn test_validation_of_fixture_markers() {
    let report = validate_markers(&text_law());
    assert_eq!(report.invalid_count, 0);
    assert_eq!(report.unresolved_count, 1);
    assert_eq!(report.inline_in_text_count, 0);
    assert_eq!(report.findings[0].location, "K2 P2");
}

#[test]
fn test_schedule_of_fixture() {
    let report = build_schedule(&markup_law(), date(2026, 1, 1));
    assert_eq!(report.total_dated_transitions, 2);
    assert_eq!(report.upcoming_transitions, 2);
    assert_eq!(report.next_transition_date, Some(date(2028, 7, 1)));
    let actions: Vec<_> = report.transitions.iter().map(|t| t.action).collect();
    assert_eq!(
        actions,
        vec![TransitionAction::BecomesActive, TransitionAction::Expires]
    );
}

#[test]
fn test_tree_serializes_to_yaml() {
    let yaml = serde_yaml_ng::to_string(&markup_law()).unwrap();
    assert!(yaml.contains("Lag om f"));
    assert!(yaml.contains("version_identity:"));
    assert!(yaml.contains("I:2028-07-01"));
    assert!(!yaml.contains("heading_just_set"));
}
