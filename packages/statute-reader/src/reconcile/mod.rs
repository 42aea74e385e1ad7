//! Reconciliation of the markup and plain-text renderings of a statute.
//!
//! Both renderings are extracted independently and then compared chapter by
//! chapter and paragraph by paragraph. Where a paragraph number has several
//! variants, the variants are paired by version identity first, then by
//! marker, then by position. Every disagreement becomes a [`Finding`] with a
//! stable key, so known differences can be allow-listed.

mod compare;
mod finding;

pub use finding::{Category, Finding, FindingType, ReconciliationResult, Severity};

use std::collections::{BTreeSet, HashMap};

use crate::config::FINDING_SNIPPET_WIDTH;
use crate::marker::parse_marker;
use crate::model::{Law, Paragraph};
use crate::normalize::{collapse_whitespace, snippet};
use compare::{
    compare_ids, equivalent_text, format_equivalent, normalize_body, normalize_id,
    normalize_marker,
};

/// A paragraph variant reduced to what reconciliation compares.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Variant {
    body: String,
    marker: String,
    version_identity: String,
}

impl Variant {
    fn from_paragraph(paragraph: &Paragraph) -> Self {
        Self {
            body: normalize_body(&paragraph.flattened_text()),
            marker: collapse_whitespace(paragraph.marker.as_deref().unwrap_or_default()),
            version_identity: collapse_whitespace(
                paragraph.version_identity.as_deref().unwrap_or_default(),
            ),
        }
    }

    /// Marker as attached to findings.
    fn marker_metadata(&self) -> Option<String> {
        (!self.marker.is_empty()).then(|| self.marker.clone())
    }
}

struct ChapterView {
    name: String,
    paragraphs: HashMap<String, Vec<Variant>>,
}

/// Chapters keyed by normalized id. Chapters sharing an id are merged and
/// identical variants are kept once.
fn index(law: &Law) -> HashMap<String, ChapterView> {
    let mut chapters: HashMap<String, ChapterView> = HashMap::new();
    for chapter in law.chapters() {
        let view = chapters
            .entry(normalize_id(&chapter.id))
            .or_insert_with(|| ChapterView {
                name: chapter.name.clone(),
                paragraphs: HashMap::new(),
            });
        for paragraph in &chapter.paragraphs {
            let variants = view
                .paragraphs
                .entry(normalize_id(&paragraph.id))
                .or_default();
            let variant = Variant::from_paragraph(paragraph);
            if !variants.contains(&variant) {
                variants.push(variant);
            }
        }
    }
    chapters
}

fn sorted_ids<'a>(a: impl Iterator<Item = &'a String>, b: impl Iterator<Item = &'a String>) -> Vec<&'a String> {
    let mut ids: Vec<&String> = a.chain(b).collect::<BTreeSet<_>>().into_iter().collect();
    ids.sort_by(|x, y| compare_ids(x, y));
    ids
}

/// Compare the markup and plain-text extractions of the same statute.
///
/// # Arguments
/// * `markup` - Law extracted from the markup rendering
/// * `text` - Law extracted from the plain-text rendering
///
/// # Returns
/// Every finding, in chapter and paragraph order.
#[must_use]
pub fn reconcile(markup: &Law, text: &Law) -> ReconciliationResult {
    let markup_index = index(markup);
    let text_index = index(text);
    let mut result = ReconciliationResult::default();

    for chapter_id in sorted_ids(markup_index.keys(), text_index.keys()) {
        let location = format!("K{chapter_id}");
        match (markup_index.get(chapter_id), text_index.get(chapter_id)) {
            (None, Some(view)) => result.push(Finding::new(
                FindingType::ChapterMissingHtml,
                &location,
                format!("Chapter missing in markup: {chapter_id} ({})", view.name),
            )),
            (Some(view), None) => result.push(Finding::new(
                FindingType::ChapterMissingText,
                &location,
                format!("Chapter missing in text: {chapter_id} ({})", view.name),
            )),
            (Some(markup_view), Some(text_view)) => {
                reconcile_chapter(chapter_id, markup_view, text_view, &mut result);
            }
            (None, None) => {}
        }
    }

    tracing::info!(
        markup = %markup.id,
        text = %text.id,
        findings = result.finding_count,
        "Reconciled renderings"
    );
    result
}

fn reconcile_chapter(
    chapter_id: &str,
    markup: &ChapterView,
    text: &ChapterView,
    result: &mut ReconciliationResult,
) {
    for paragraph_id in sorted_ids(markup.paragraphs.keys(), text.paragraphs.keys()) {
        let location = format!("K{chapter_id} P{paragraph_id}");
        let (markup_variants, text_variants) = match (
            markup.paragraphs.get(paragraph_id),
            text.paragraphs.get(paragraph_id),
        ) {
            (Some(m), Some(t)) => (m, t),
            (None, Some(_)) => {
                result.push(Finding::new(
                    FindingType::ParagraphMissingHtml,
                    &location,
                    format!("Paragraph missing in markup: {location}"),
                ));
                continue;
            }
            (Some(_), None) => {
                result.push(Finding::new(
                    FindingType::ParagraphMissingText,
                    &location,
                    format!("Paragraph missing in text: {location}"),
                ));
                continue;
            }
            (None, None) => continue,
        };

        if markup_variants.len() != text_variants.len() {
            result.push(Finding::new(
                FindingType::ParagraphVariantCount,
                &location,
                format!(
                    "Different variant count at {location} (markup={}, text={})",
                    markup_variants.len(),
                    text_variants.len()
                ),
            ));
        }

        for (index, (markup_variant, text_variant)) in
            align_variants(markup_variants, text_variants).into_iter().enumerate()
        {
            compare_variants(&location, index + 1, markup_variant, text_variant, result);
        }
    }
}

/// Pair markup variants with text variants.
///
/// At most `min(markup, text)` pairs are produced, in markup order.
fn align_variants<'a>(markup: &'a [Variant], text: &'a [Variant]) -> Vec<(&'a Variant, &'a Variant)> {
    let mut used = vec![false; text.len()];
    let mut pairs = Vec::new();
    for (position, markup_variant) in markup.iter().enumerate().take(text.len()) {
        let Some(chosen) = choose_text_variant(markup_variant, text, &used, position) else {
            break;
        };
        used[chosen] = true;
        pairs.push((markup_variant, &text[chosen]));
    }
    pairs
}

fn choose_text_variant(markup: &Variant, text: &[Variant], used: &[bool], position: usize) -> Option<usize> {
    let unused = |index: &usize| !used[*index];
    let matching = |key: fn(&Variant) -> &str| {
        let wanted = normalize_marker(key(markup));
        if wanted.is_empty() {
            return None;
        }
        (0..text.len())
            .filter(unused)
            .find(|&index| normalize_marker(key(&text[index])) == wanted)
    };

    matching(|v| v.version_identity.as_str())
        .or_else(|| matching(|v| v.marker.as_str()))
        .or_else(|| Some(position).filter(|p| *p < text.len() && !used[*p]))
        .or_else(|| (0..text.len()).find(unused))
}

fn compare_variants(
    location: &str,
    number: usize,
    markup: &Variant,
    text: &Variant,
    result: &mut ReconciliationResult,
) {
    let key = format!("{location}#V{number}");
    let label = format!("{location} [variant {number}]");
    let markers = || (markup.marker_metadata(), text.marker_metadata());

    let markup_status = parse_marker(Some(markup.marker.as_str()));
    let text_status = parse_marker(Some(text.marker.as_str()));
    if markup_status.is_invalid() || text_status.is_invalid() {
        let (m, t) = markers();
        result.push(
            Finding::new(
                FindingType::ParagraphPeriodiseringInvalid,
                &key,
                format!(
                    "Invalid marker at {label}{}{}",
                    quoted_if(markup_status.is_invalid(), "markup", &markup.marker),
                    quoted_if(text_status.is_invalid(), "text", &text.marker)
                ),
            )
            .with_markers(m, t),
        );
    } else if markup_status.is_unresolved() || text_status.is_unresolved() {
        let (m, t) = markers();
        result.push(
            Finding::new(
                FindingType::ParagraphPeriodiseringUnresolved,
                &key,
                format!(
                    "Unresolved marker at {label}{}{}",
                    quoted_if(markup_status.is_unresolved(), "markup", &markup.marker),
                    quoted_if(text_status.is_unresolved(), "text", &text.marker)
                ),
            )
            .with_markers(m, t),
        );
    }

    let markup_marker = normalize_marker(&markup.marker);
    let text_marker = normalize_marker(&text.marker);
    if !markup_marker.is_empty() && !text_marker.is_empty() && markup_marker != text_marker {
        let (m, t) = markers();
        result.push(
            Finding::new(
                FindingType::ParagraphPeriodiseringMismatch,
                &key,
                format!(
                    "Marker mismatch at {label}{}{}",
                    quoted_if(true, "markup", &markup.marker),
                    quoted_if(true, "text", &text.marker)
                ),
            )
            .with_markers(m, t),
        );
    }

    if markup.body.trim().is_empty() && !text.body.trim().is_empty() {
        let (m, t) = markers();
        result.push(
            Finding::new(
                FindingType::ParagraphEmptyHtml,
                &key,
                format!("Markup body empty while text has content at {label}"),
            )
            .with_markers(m, t),
        );
        return;
    }

    if equivalent_text(&markup.body, &text.body) {
        return;
    }

    let (finding_type, summary) = if format_equivalent(&markup.body, &text.body) {
        (FindingType::ParagraphTextFormatOnly, "Format-only difference")
    } else {
        (FindingType::ParagraphTextMismatch, "Text mismatch")
    };
    let (m, t) = markers();
    result.push(
        Finding::new(
            finding_type,
            &key,
            format!(
                "{summary} at {label}{}{}{}",
                marker_note(&markup.marker, &text.marker),
                quoted_if(true, "markup", &markup.body),
                quoted_if(true, "text", &text.body)
            ),
        )
        .with_markers(m, t),
    );
}

fn quoted_if(condition: bool, label: &str, value: &str) -> String {
    if condition {
        format!(" {label}=\"{}\"", snippet(value, FINDING_SNIPPET_WIDTH))
    } else {
        String::new()
    }
}

fn marker_note(markup: &str, text: &str) -> String {
    match (markup.is_empty(), text.is_empty()) {
        (true, true) => String::new(),
        _ if markup == text => quoted_if(true, "marker", markup),
        _ => format!(
            "{}{}",
            quoted_if(true, "markup_marker", markup),
            quoted_if(true, "text_marker", text)
        ),
    }
}
