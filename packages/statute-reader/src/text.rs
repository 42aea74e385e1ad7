//! Structural extraction from the plain-text rendering of a statute.
//!
//! The plain-text rendering has no markup at all: structure is recognized
//! line by line. Blank lines separate parts, and a marker may open a
//! paragraph as a slash-wrapped prefix (`3 § /Träder i kraft I:2028-07-01/
//! Text...`).

use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;

use crate::config::{
    is_transitional_heading, AUTO_CHAPTER_ID, AUTO_CHAPTER_NAME, LOG_SNIPPET_WIDTH,
    TRANSITIONAL_CHAPTER_PREFIX,
};
use crate::error::Result;
use crate::marker::{contains_inline_marker, split_marker_prefix};
use crate::model::{Chapter, ChapterSlot, Division, Law, Paragraph, Subdivision};
use crate::normalize::{nfc, normalize_number_token, snippet};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIVISION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AVD\.\s+([A-Z])\s+(.+)$").expect("valid regex"));

/// Roman numeral, then at least two spaces.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SUBDIVISION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([IVX]+)\s{2,}(.+)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\s*[a-z]?)\s+kap\.\s+([A-ZÅÄÖ].+)$").expect("valid regex")
});

/// Paragraph number, a single "§" and the rest of the line.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARAGRAPH_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\s*[a-z]?)\s*§(?:$|([^§].*)$)").expect("valid regex")
});

/// Extract a statute from plain-text lines.
///
/// # Arguments
/// * `lines` - Lines of the plain-text rendering, without line terminators
/// * `law_name` - Name stored on the resulting law
/// * `law_id` - Identifier stored on the resulting law
///
/// # Examples
/// ```
/// use statute_reader::text::extract_from_text;
///
/// let lines = ["1 kap. Inledande bestämmelser", "", "1 § Denna lag gäller."];
/// let law = extract_from_text(lines, "Testlag", "2024:1").unwrap();
/// assert_eq!(law.find_paragraphs("1", "1")[0].flattened_text(), "Denna lag gäller.");
/// ```
pub fn extract_from_text<I, S>(lines: I, law_name: &str, law_id: &str) -> Result<Law>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut extractor = TextExtractor::new(Law::new(law_name, law_id));
    for line in lines {
        extractor.line(line.as_ref());
    }
    Ok(extractor.finish())
}

/// Extract a statute from a reader over the plain-text rendering.
pub fn extract_from_reader<R: BufRead>(reader: R, law_name: &str, law_id: &str) -> Result<Law> {
    let mut extractor = TextExtractor::new(Law::new(law_name, law_id));
    for line in reader.lines() {
        extractor.line(&line?);
    }
    Ok(extractor.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenPart {
    chapter: ChapterSlot,
    paragraph: usize,
    part: usize,
}

struct TextExtractor {
    law: Law,
    division: Option<usize>,
    chapter: Option<ChapterSlot>,
    open: Option<OpenPart>,
    /// A blank line ended the current part.
    part_break: bool,
    seen_chapter: bool,
    transitional_serial: usize,
}

impl TextExtractor {
    fn new(law: Law) -> Self {
        Self {
            law,
            division: None,
            chapter: None,
            open: None,
            part_break: false,
            seen_chapter: false,
            transitional_serial: 0,
        }
    }

    fn finish(mut self) -> Law {
        self.law.prune();
        tracing::info!(
            law = %self.law.id,
            chapters = self.law.chapters().count(),
            paragraphs = self.law.paragraph_count(),
            "Extracted statute from plain text"
        );
        self.law
    }

    fn line(&mut self, raw: &str) {
        let normalized = nfc(raw);
        let line = normalized.trim();

        if line.is_empty() {
            if let Some(open) = self.open {
                let has_text = self
                    .law
                    .paragraph_mut(open.chapter, open.paragraph)
                    .and_then(|p| p.parts.get(open.part))
                    .is_some_and(|part| !part.is_empty());
                if has_text {
                    self.part_break = true;
                }
            }
            return;
        }

        if let Some(caps) = DIVISION_LINE.captures(line) {
            self.start_division(Division::new(&caps[1], caps[2].trim()));
        } else if let Some(caps) = SUBDIVISION_LINE.captures(line) {
            self.start_subdivision(Subdivision::new(&caps[1], caps[2].trim()));
        } else if let Some(caps) = CHAPTER_LINE.captures(line) {
            self.seen_chapter = true;
            self.start_chapter(Chapter::new(normalize_number_token(&caps[1]), caps[2].trim()));
        } else if is_transitional_heading(line) {
            self.transitional_serial += 1;
            let id = format!("{TRANSITIONAL_CHAPTER_PREFIX}{}", self.transitional_serial);
            self.start_chapter(Chapter::transitional(id, line, !self.seen_chapter));
        } else if let Some(caps) = PARAGRAPH_LINE.captures(line) {
            let rest = caps.get(2).map_or("", |m| m.as_str().trim());
            self.start_paragraph(&normalize_number_token(&caps[1]), rest);
        } else {
            self.body(line);
        }
    }

    fn start_division(&mut self, division: Division) {
        self.division = Some(self.law.add_division(division));
        self.chapter = None;
        self.close_paragraph();
    }

    fn start_subdivision(&mut self, subdivision: Subdivision) {
        match self.division.and_then(|index| self.law.divisions.get_mut(index)) {
            Some(division) => division.set_current_subdivision(subdivision),
            None => tracing::debug!(subdivision = %subdivision.id, "Subdivision outside any division"),
        }
        self.chapter = None;
        self.close_paragraph();
    }

    fn start_chapter(&mut self, chapter: Chapter) {
        tracing::debug!(chapter = %chapter.id, kind = ?chapter.kind, "Chapter");
        self.chapter = Some(self.law.add_chapter_to(self.division, chapter));
        self.close_paragraph();
    }

    fn close_paragraph(&mut self) {
        self.open = None;
        self.part_break = false;
    }

    fn start_paragraph(&mut self, id: &str, rest: &str) {
        let chapter = match self.chapter {
            Some(slot) => slot,
            None => {
                let division = match self.division {
                    Some(index) => index,
                    None => {
                        let index = self.law.auto_division();
                        self.division = Some(index);
                        index
                    }
                };
                tracing::warn!(paragraph = %id, "Paragraph outside any chapter, fabricating one");
                let slot = self.law.add_chapter_to(
                    Some(division),
                    Chapter::synthetic(AUTO_CHAPTER_ID, AUTO_CHAPTER_NAME),
                );
                self.chapter = Some(slot);
                slot
            }
        };

        let Some(target) = self.law.chapter_mut(chapter) else {
            return;
        };
        let paragraph = target.add_paragraph(Paragraph::new(id));
        let part = target.paragraphs[paragraph].start_next_part();
        self.open = Some(OpenPart {
            chapter,
            paragraph,
            part,
        });
        self.part_break = false;

        let (marker, body) = split_marker_prefix(rest);
        if let Some(marker) = marker {
            if let Some(paragraph) = self.law.paragraph_mut(chapter, paragraph) {
                paragraph.set_marker(&marker);
            }
        }
        if !body.is_empty() {
            self.append(&body);
        }
    }

    fn body(&mut self, line: &str) {
        let Some(mut open) = self.open else {
            tracing::trace!(line = %line, "Text outside any paragraph");
            return;
        };

        if self.part_break {
            if let Some(paragraph) = self.law.paragraph_mut(open.chapter, open.paragraph) {
                open.part = paragraph.start_next_part();
                self.open = Some(open);
            }
            self.part_break = false;
        }

        let (marker, body) = split_marker_prefix(line);
        if let Some(marker) = marker {
            if let Some(paragraph) = self.law.paragraph_mut(open.chapter, open.paragraph) {
                if paragraph.marker.is_none() {
                    paragraph.set_marker(&marker);
                }
            }
        }
        if !body.is_empty() {
            self.append(&body);
        }
    }

    fn append(&mut self, text: &str) {
        let Some(open) = self.open else {
            return;
        };
        let chapter_id = self
            .law
            .chapter(open.chapter)
            .map(|c| c.id.clone())
            .unwrap_or_default();
        let Some(paragraph) = self.law.paragraph_mut(open.chapter, open.paragraph) else {
            return;
        };
        if contains_inline_marker(text) {
            tracing::warn!(
                chapter = %chapter_id,
                paragraph = %paragraph.id,
                text = %snippet(text, LOG_SNIPPET_WIDTH),
                "Marker left inside body text"
            );
        }
        if let Some(part) = paragraph.parts.get_mut(open.part) {
            part.add_line(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterKind, VersionStatus};
    use pretty_assertions::assert_eq;

    fn extract(text: &str) -> Law {
        extract_from_text(text.lines(), "Testlag", "2024:1").unwrap()
    }

    #[test]
    fn test_paragraph_line_pattern() {
        assert!(PARAGRAPH_LINE.is_match("1 § Text"));
        assert!(PARAGRAPH_LINE.is_match("3 a § Text"));
        assert!(PARAGRAPH_LINE.is_match("3a §"));
        assert!(PARAGRAPH_LINE.is_match("12 §Text"));
        assert!(!PARAGRAPH_LINE.is_match("1 §§ Text"));
        assert!(!PARAGRAPH_LINE.is_match("Enligt 1 § gäller"));
    }

    #[test]
    fn test_chapters_and_parts() {
        let law = extract(
            "1 kap. Inledande bestämmelser\n\
             \n\
             1 § Första stycket\n\
             fortsätter här.\n\
             \n\
             Andra stycket.\n\
             \n\
             2 § Ensam paragraf.\n",
        );
        let first = law.find_paragraphs("1", "1")[0];
        assert_eq!(first.parts.len(), 2);
        assert_eq!(first.parts[0].lines, vec!["Första stycket", "fortsätter här."]);
        assert_eq!(first.parts[1].number, 2);
        assert_eq!(first.parts[1].lines, vec!["Andra stycket."]);
        assert_eq!(law.find_paragraphs("1", "2")[0].parts.len(), 1);
    }

    #[test]
    fn test_blank_line_before_body_does_not_split() {
        let law = extract("1 kap. Inledning\n1 §\n\nText efter tom rad.\n");
        let paragraph = law.find_paragraphs("1", "1")[0];
        assert_eq!(paragraph.parts.len(), 1);
        assert_eq!(paragraph.flattened_text(), "Text efter tom rad.");
    }

    #[test]
    fn test_divisions_and_subdivisions() {
        let law = extract(
            "AVD. A ÖVERGRIPANDE BESTÄMMELSER\n\
             I  Inledande bestämmelser\n\
             1 kap. Innehåll\n\
             1 § Text.\n\
             AVD. B FAMILJEFÖRMÅNER\n\
             2 kap. Föräldrapenning\n\
             1 § Text.\n",
        );
        assert_eq!(law.divisions.len(), 2);
        let chapter = &law.divisions[0].chapters[0];
        assert_eq!(chapter.division.as_deref(), Some("A"));
        assert_eq!(
            chapter.subdivision,
            Some(Subdivision::new("I", "Inledande bestämmelser"))
        );
        assert_eq!(law.divisions[1].chapters[0].name, "Föräldrapenning");
    }

    #[test]
    fn test_nbsp_in_numbers() {
        let law = extract("2\u{a0}a kap. Särskilda regler\n3\u{a0}b § Text.\n");
        assert_eq!(law.find_paragraphs("2 a", "3 b").len(), 1);
    }

    #[test]
    fn test_marker_prefix_and_variants() {
        let law = extract(
            "1 kap. Inledning\n\
             13 § /Upphör att gälla U:2028-07-01/ Gammal lydelse.\n\
             13 § /Träder i kraft I:2028-07-01/ Ny lydelse.\n",
        );
        let variants = law.find_paragraphs("1", "13");
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].version_identity.as_deref(), Some("U:2028-07-01"));
        assert_eq!(variants[0].flattened_text(), "Gammal lydelse.");
        assert_eq!(variants[1].version_status, VersionStatus::Dated);
        assert_eq!(variants[1].flattened_text(), "Ny lydelse.");
    }

    #[test]
    fn test_marker_on_body_line_only_when_unset() {
        let law = extract(
            "1 kap. Inledning\n\
             1 §\n\
             /Träder i kraft I:2028-07-01/ Text.\n\
             /Upphör att gälla U:2030-01-01/ Mer text.\n",
        );
        let paragraph = law.find_paragraphs("1", "1")[0];
        assert_eq!(paragraph.version_identity.as_deref(), Some("I:2028-07-01"));
        assert_eq!(paragraph.flattened_text(), "Text. Mer text.");
    }

    #[test]
    fn test_paragraph_before_any_chapter() {
        let law = extract("1 § Text.\n2 § Mer.\n");
        assert_eq!(law.divisions.len(), 1);
        assert_eq!(law.divisions[0].id, "A");
        assert_eq!(law.divisions[0].name, "AUTO");
        let chapter = &law.divisions[0].chapters[0];
        assert!(chapter.synthetic);
        assert_eq!(chapter.id, "1");
        assert_eq!(chapter.paragraphs.len(), 2);
    }

    #[test]
    fn test_transitional_chapters() {
        let law = extract(
            "1 kap. Inledning\n\
             1 § Text.\n\
             Övergångsbestämmelser\n\
             2018:1233\n\
             1. Denna lag träder i kraft den 1 januari 2019.\n\
             Övergångsbestämmelser\n",
        );
        let chapters: Vec<_> = law.chapters().collect();
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[1].id, "Ö1");
        assert_eq!(chapters[1].kind, ChapterKind::Transitional);
        assert!(!chapters[1].synthetic);
        assert_eq!(chapters[2].id, "Ö2");
    }

    #[test]
    fn test_transitional_before_any_chapter_is_synthetic() {
        let law = extract("Övergångsbestämmelser\n1 § Text.\n");
        let chapter = law.chapters().next().unwrap();
        assert!(chapter.synthetic);
        assert_eq!(chapter.kind, ChapterKind::Transitional);
        assert_eq!(chapter.paragraphs.len(), 1);
    }

    #[test]
    fn test_text_outside_paragraph_is_ignored() {
        let law = extract("Lag om test\n1 kap. Inledning\nInledande text.\n1 § Text.\n");
        assert_eq!(law.find_paragraphs("1", "1")[0].flattened_text(), "Text.");
    }

    #[test]
    fn test_items_and_held_text() {
        let law = extract(
            "5 kap. Indelning\n\
             1 § Lagen är indelad:\n\
             7. första,\n\
             \n\
             Avdelning E innehåller\n\
             8. andra,\n\
             8 a. tredje,\n\
             Avdelning F innehåller\n\
             9. fjärde.\n",
        );
        let paragraph = law.find_paragraphs("5", "1")[0];
        assert_eq!(paragraph.parts.len(), 3);
        assert_eq!(paragraph.parts[1].items.len(), 2);
        assert_eq!(paragraph.parts[1].items[1].token, "8 a.");
        assert_eq!(paragraph.parts[2].lines, vec!["Avdelning F innehåller", "9. fjärde."]);
    }

    #[test]
    fn test_reader_input() {
        let input = "1 kap. Inledning\r\n1 § Text.\r\n";
        let law = extract_from_reader(input.as_bytes(), "Testlag", "2024:1").unwrap();
        assert_eq!(law.find_paragraphs("1", "1")[0].flattened_text(), "Text.");
    }
}
