//! Effective-date filter.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use super::location_key;
use crate::model::{Chapter, Law};

/// What [`apply_effective_date`] kept and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveDateReport {
    pub effective_date: NaiveDate,
    /// Variants kept from groups with more than one variant.
    pub selected_variants: usize,
    pub dropped_variants: usize,
    /// Groups where no variant was known to apply.
    pub ambiguous_groups: usize,
    pub unresolved_markers: usize,
    pub invalid_markers: usize,
    pub unresolved_paragraphs: Vec<String>,
    pub invalid_paragraphs: Vec<String>,
    pub chapter_count_before: usize,
    pub chapter_count_after: usize,
    pub paragraph_groups_before: usize,
    pub paragraph_groups_after: usize,
    pub paragraph_variants_before: usize,
    pub paragraph_variants_after: usize,
}

impl EffectiveDateReport {
    fn new(effective_date: NaiveDate) -> Self {
        Self {
            effective_date,
            selected_variants: 0,
            dropped_variants: 0,
            ambiguous_groups: 0,
            unresolved_markers: 0,
            invalid_markers: 0,
            unresolved_paragraphs: Vec::new(),
            invalid_paragraphs: Vec::new(),
            chapter_count_before: 0,
            chapter_count_after: 0,
            paragraph_groups_before: 0,
            paragraph_groups_after: 0,
            paragraph_variants_before: 0,
            paragraph_variants_after: 0,
        }
    }
}

/// Keep, per chapter and paragraph number, the variants that apply on
/// `effective_date`.
///
/// A paragraph number with a single variant is always kept. In a group of
/// several variants:
///
/// 1. dated markers decide by date, and variants without a marker count as
///    applying;
/// 2. when nothing applies, variants with unresolved or invalid markers are
///    kept instead, since their applicability is unknown;
/// 3. when even those are missing, every variant is kept.
///
/// Cases 2 and 3 are counted as ambiguous groups.
pub fn apply_effective_date(law: &mut Law, effective_date: NaiveDate) -> EffectiveDateReport {
    let mut report = EffectiveDateReport::new(effective_date);
    report.chapter_count_before = law.chapters().count();
    report.paragraph_groups_before = count_groups(law);
    report.paragraph_variants_before = law.paragraph_count();

    for chapter in law.chapters_mut() {
        filter_chapter(chapter, effective_date, &mut report);
    }

    report.chapter_count_after = law.chapters().count();
    report.paragraph_groups_after = count_groups(law);
    report.paragraph_variants_after = law.paragraph_count();

    tracing::info!(
        date = %effective_date,
        selected = report.selected_variants,
        dropped = report.dropped_variants,
        ambiguous = report.ambiguous_groups,
        "Applied effective date"
    );
    report
}

/// Paragraph indices grouped by number, in order of first appearance.
fn group_by_number(chapter: &Chapter) -> Vec<Vec<usize>> {
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, paragraph) in chapter.paragraphs.iter().enumerate() {
        match position.get(paragraph.id.as_str()) {
            Some(&group) => groups[group].push(index),
            None => {
                position.insert(paragraph.id.as_str(), groups.len());
                groups.push(vec![index]);
            }
        }
    }
    groups
}

fn count_groups(law: &Law) -> usize {
    law.chapters().map(|c| group_by_number(c).len()).sum()
}

fn push_unique(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|k| k == key) {
        keys.push(key.to_string());
    }
}

fn filter_chapter(chapter: &mut Chapter, date: NaiveDate, report: &mut EffectiveDateReport) {
    let mut keep = vec![false; chapter.paragraphs.len()];

    for group in group_by_number(chapter) {
        if let [only] = group.as_slice() {
            keep[*only] = true;
            continue;
        }

        let location = location_key(&chapter.id, &chapter.paragraphs[group[0]].id);
        let mut active = Vec::new();
        let mut unknown = Vec::new();
        for &index in &group {
            let status = chapter.paragraphs[index].marker_status();
            if status.is_invalid() {
                report.invalid_markers += 1;
                push_unique(&mut report.invalid_paragraphs, &location);
                unknown.push(index);
            } else if status.is_unresolved() {
                report.unresolved_markers += 1;
                push_unique(&mut report.unresolved_paragraphs, &location);
                unknown.push(index);
            } else if status.is_active_on(date).unwrap_or(true) {
                active.push(index);
            }
        }

        let selected = if !active.is_empty() {
            active
        } else if !unknown.is_empty() {
            report.ambiguous_groups += 1;
            tracing::warn!(paragraph = %location, "No variant applies, keeping those with unknown applicability");
            unknown
        } else {
            report.ambiguous_groups += 1;
            tracing::warn!(paragraph = %location, "No variant applies, keeping all");
            group.clone()
        };

        report.selected_variants += selected.len();
        report.dropped_variants += group.len() - selected.len();
        for index in selected {
            keep[index] = true;
        }
    }

    let mut flags = keep.into_iter();
    chapter
        .paragraphs
        .retain(|_| flags.next().unwrap_or(true));
}
