//! Stack-driven walk over the markup rendering.
//!
//! The document is flat: headings, anchors and text runs follow each other
//! inside one container, and nesting has to be recovered from what they
//! say. The extractor keeps an explicit stack of open nodes. Element rules
//! close the stack down to the level where the new node belongs and push
//! it; text rules dispatch on whatever is on top.

use regex::Regex;
use std::sync::LazyLock;

use super::MarkupNode;
use crate::config::{AUTO_CHAPTER_ID, AUTO_CHAPTER_NAME, PARAGRAPH_ANCHOR_CLASS, TOC_CLASS};
use crate::error::{Result, StatuteError};
use crate::marker::{bracketed_marker, parse_marker};
use crate::model::{
    Chapter, ChapterSlot, Directive, Division, Heading, Law, NodeKind, Paragraph, Reference,
    Subdivision,
};
use crate::normalize::{collapse_whitespace, normalize_number_token};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIVISION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AVD\.\s+([A-Z])\s+(.+)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static CHAPTER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\s*[a-z]?)\s+kap\.\s+(.+)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static SUBDIVISION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([IVX]+)\s+(.+)$").expect("valid regex"));

/// Anchor id of a paragraph: K{chapter}P{paragraph}.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARAGRAPH_ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^K(\d+[a-zA-Z]?)P(\d+[a-zA-Z]?)$").expect("valid regex")
});

/// Anchor id of a part: K{chapter}P{paragraph}S{part}.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PART_ANCHOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^K\d+[a-zA-Z]?P\d+[a-zA-Z]?S\d+$").expect("valid regex")
});

/// A bare paragraph number such as "3 a §", repeated at the start of a part.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static PARAGRAPH_TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\s*[a-z]?\s*§$").expect("valid regex"));

/// An open node. Tree nodes are addressed by index into the [`Law`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Law,
    Division(usize),
    Subdivision,
    Chapter(ChapterSlot),
    Heading,
    Paragraph(ChapterSlot, usize),
    Part(ChapterSlot, usize, usize),
    Reference(Reference),
    Directive(Directive),
}

impl Frame {
    fn kind(&self) -> NodeKind {
        match self {
            Frame::Law => NodeKind::Law,
            Frame::Division(_) => NodeKind::Division,
            Frame::Subdivision => NodeKind::Subdivision,
            Frame::Chapter(_) => NodeKind::Chapter,
            Frame::Heading => NodeKind::Heading,
            Frame::Paragraph(..) => NodeKind::Paragraph,
            Frame::Part(..) => NodeKind::Part,
            Frame::Reference(_) => NodeKind::Reference,
            Frame::Directive(_) => NodeKind::Directive,
        }
    }
}

/// Extract a statute from a markup document.
///
/// The walk starts at the first `div` that is not the table of contents and
/// visits its nodes in document order. Table-of-contents subtrees are
/// skipped wherever they occur.
///
/// # Arguments
/// * `document` - Document root (or any ancestor of the statute container)
/// * `law_name` - Name stored on the resulting law
/// * `law_id` - Identifier stored on the resulting law
///
/// # Returns
/// * `Ok(Law)` with every paragraph pruned
/// * `Err(StatuteError::MissingRoot)` when no container exists
pub fn extract_from_markup<N: MarkupNode>(document: N, law_name: &str, law_id: &str) -> Result<Law> {
    let root = find_container(document).ok_or_else(|| StatuteError::MissingRoot {
        context: Some(format!("no <div> outside the {TOC_CLASS} table of contents")),
    })?;

    let mut extractor = MarkupExtractor::new(Law::new(law_name, law_id));

    let mut pending = vec![root];
    while let Some(node) = pending.pop() {
        if node.has_class(TOC_CLASS) {
            continue;
        }
        if let Some(text) = node.text_run() {
            extractor.text(text);
            continue;
        }
        extractor.element(node);
        pending.extend(node.child_nodes().into_iter().rev());
    }

    let mut law = extractor.finish();
    law.prune();
    tracing::info!(
        law = %law.id,
        chapters = law.chapters().count(),
        paragraphs = law.paragraph_count(),
        "Extracted statute from markup"
    );
    Ok(law)
}

/// First `div` in document order that is not the table of contents.
fn find_container<N: MarkupNode>(document: N) -> Option<N> {
    let mut pending = vec![document];
    while let Some(node) = pending.pop() {
        if node.is_tag("div") {
            if !node.has_class(TOC_CLASS) {
                return Some(node);
            }
            continue;
        }
        pending.extend(node.child_nodes().into_iter().rev());
    }
    None
}

struct MarkupExtractor {
    law: Law,
    stack: Vec<Frame>,
}

impl MarkupExtractor {
    fn new(law: Law) -> Self {
        Self {
            law,
            stack: vec![Frame::Law],
        }
    }

    fn finish(self) -> Law {
        self.law
    }

    fn top(&self) -> Option<&Frame> {
        self.stack.last()
    }

    fn push(&mut self, rule: &str, frame: Frame) {
        tracing::trace!(rule, frame = ?frame, depth = self.stack.len(), "push");
        self.stack.push(frame);
    }

    /// Pop the top frame. The law frame is never popped.
    fn pop(&mut self, rule: &str) -> Option<Frame> {
        if self.stack.len() <= 1 {
            return None;
        }
        let frame = self.stack.pop();
        tracing::trace!(rule, frame = ?frame, depth = self.stack.len(), "pop");
        frame
    }

    /// Pop every frame more specific than `level`.
    fn close_down_to(&mut self, rule: &str, level: NodeKind) {
        while self.top().is_some_and(|frame| frame.kind() > level) {
            if self.pop(rule).is_none() {
                break;
            }
        }
    }

    fn element<N: MarkupNode>(&mut self, node: N) {
        let Some(name) = node.element_name() else {
            return;
        };
        match name.to_ascii_lowercase().as_str() {
            "h2" => self.division(&collapse_whitespace(&node.text_content())),
            "h3" => self.chapter(&collapse_whitespace(&node.text_content())),
            "h4" => self.heading(&collapse_whitespace(&node.text_content())),
            "a" => self.anchor(node),
            "i" => self.inline(&collapse_whitespace(&node.text_content())),
            _ => {}
        }
    }

    fn division(&mut self, text: &str) {
        let Some(caps) = DIVISION_PATTERN.captures(text) else {
            tracing::debug!(text = %text, "Level-2 heading is not a division");
            return;
        };
        self.close_down_to("division", NodeKind::Law);
        let index = self
            .law
            .add_division(Division::new(&caps[1], caps[2].trim()));
        self.push("division", Frame::Division(index));
    }

    fn chapter(&mut self, text: &str) {
        let Some(caps) = CHAPTER_PATTERN.captures(text) else {
            tracing::debug!(text = %text, "Level-3 heading is not a chapter");
            return;
        };
        self.close_down_to("chapter", NodeKind::Division);
        let chapter = Chapter::new(normalize_number_token(&caps[1]), caps[2].trim());
        let division = match self.top() {
            Some(Frame::Division(index)) => Some(*index),
            _ => None,
        };
        let slot = self.law.add_chapter_to(division, chapter);
        self.push("chapter", Frame::Chapter(slot));
    }

    /// A level-4 heading is either a subdivision or a paragraph heading.
    fn heading(&mut self, text: &str) {
        if let Some(caps) = SUBDIVISION_PATTERN.captures(text) {
            self.close_down_to("subdivision", NodeKind::Division);
            if let Some(Frame::Division(index)) = self.top().cloned() {
                if let Some(division) = self.law.divisions.get_mut(index) {
                    division.set_current_subdivision(Subdivision::new(&caps[1], caps[2].trim()));
                }
                self.push("subdivision", Frame::Subdivision);
            } else {
                tracing::debug!(text = %text, "Subdivision outside any division");
            }
            return;
        }

        self.close_down_to("heading", NodeKind::Chapter);
        if let Some(Frame::Chapter(slot)) = self.top().cloned() {
            if let Some(chapter) = self.law.chapter_mut(slot) {
                chapter.push_heading(Heading::new(text));
            }
            self.push("heading", Frame::Heading);
        } else {
            tracing::debug!(text = %text, "Heading outside any chapter");
        }
    }

    fn anchor<N: MarkupNode>(&mut self, node: N) {
        let Some(id) = node
            .attribute_value("id")
            .filter(|id| !id.is_empty())
            .or_else(|| node.attribute_value("name"))
        else {
            return;
        };

        if node.has_class(PARAGRAPH_ANCHOR_CLASS) {
            match PARAGRAPH_ANCHOR_PATTERN.captures(id) {
                Some(caps) => self.paragraph(&caps[2]),
                None => tracing::debug!(id = %id, "Paragraph anchor with unexpected id"),
            }
        } else if PART_ANCHOR_PATTERN.is_match(id) {
            self.part();
        }
    }

    fn paragraph(&mut self, id: &str) {
        self.close_down_to("paragraph", NodeKind::Chapter);
        let slot = match self.top().cloned() {
            Some(Frame::Chapter(slot)) => slot,
            other => {
                let division = match other {
                    Some(Frame::Division(index)) => index,
                    _ => self.law.auto_division(),
                };
                tracing::warn!(paragraph = %id, "Paragraph outside any chapter, fabricating one");
                let slot = self.law.add_chapter_to(
                    Some(division),
                    Chapter::synthetic(AUTO_CHAPTER_ID, AUTO_CHAPTER_NAME),
                );
                self.push("paragraph", Frame::Chapter(slot));
                slot
            }
        };

        let Some(chapter) = self.law.chapter_mut(slot) else {
            return;
        };
        let index = chapter.add_paragraph(Paragraph::new(id));
        let part = chapter.paragraphs[index].start_next_part();
        self.push("paragraph", Frame::Paragraph(slot, index));
        self.push("paragraph", Frame::Part(slot, index, part));
    }

    /// A part anchor closes the open part and opens the next one.
    fn part(&mut self) {
        self.close_down_to("part", NodeKind::Paragraph);
        if let Some(Frame::Paragraph(slot, index)) = self.top().cloned() {
            if let Some(paragraph) = self.law.paragraph_mut(slot, index) {
                let part = paragraph.start_next_part();
                self.push("part", Frame::Part(slot, index, part));
            }
        }
    }

    /// Italic runs carry amendment citations, or editorial directives when
    /// they start with "/". A slash-wrapped marker is left to the text rules.
    fn inline(&mut self, text: &str) {
        if text.starts_with('/') {
            if marker_run(text).is_none()
                && matches!(self.top(), Some(Frame::Paragraph(..) | Frame::Part(..)))
            {
                self.push(
                    "directive",
                    Frame::Directive(Directive {
                        text: text.to_string(),
                    }),
                );
            }
        } else if matches!(self.top(), Some(Frame::Part(..))) {
            self.push(
                "reference",
                Frame::Reference(Reference {
                    text: text.to_string(),
                }),
            );
        }
    }

    fn text(&mut self, raw: &str) {
        let text = collapse_whitespace(raw);
        if text.is_empty() {
            return;
        }

        let Some(top) = self.top().cloned() else {
            return;
        };
        match top {
            Frame::Reference(reference) => {
                self.pop("reference-text");
                if let Some(Frame::Part(slot, index, part)) = self.top().cloned() {
                    if let Some(paragraph) = self.law.paragraph_mut(slot, index) {
                        paragraph.add_citation(reference.text.clone());
                        paragraph.parts[part].add_line(reference.text);
                    }
                }
            }
            Frame::Directive(directive) => {
                self.pop("directive-text");
                tracing::debug!(directive = %directive.text, "Skipping editorial directive");
            }
            Frame::Part(slot, index, part) => {
                let Some(paragraph) = self.law.paragraph_mut(slot, index) else {
                    return;
                };
                if let Some(marker) = marker_run(&text) {
                    tracing::debug!(paragraph = %paragraph.id, marker = %marker, "Paragraph marker");
                    paragraph.set_marker(marker);
                } else if paragraph.parts[part].is_empty() && PARAGRAPH_TOKEN_PATTERN.is_match(&text) {
                    tracing::trace!(token = %text, "Dropping repeated paragraph number");
                } else {
                    paragraph.parts[part].add_line(text);
                }
            }
            Frame::Paragraph(slot, index) => {
                if let Some(marker) = marker_run(&text) {
                    if let Some(chapter) = self.law.chapter_mut(slot) {
                        tracing::debug!(chapter = %chapter.id, marker = %marker, "Chapter marker");
                        chapter.set_marker(marker);
                    }
                    return;
                }
                let Some(paragraph) = self.law.paragraph_mut(slot, index) else {
                    return;
                };
                if !paragraph.is_empty() {
                    tracing::debug!(paragraph = %paragraph.id, text = %text, "Ignoring text between parts");
                    return;
                }
                let part = paragraph.start_next_part();
                if !PARAGRAPH_TOKEN_PATTERN.is_match(&text) {
                    paragraph.parts[part].add_line(text);
                }
                self.push("paragraph-text", Frame::Part(slot, index, part));
            }
            Frame::Subdivision | Frame::Heading => {
                self.pop("heading-text");
            }
            Frame::Chapter(slot) => match marker_run(&text) {
                Some(marker) => {
                    if let Some(chapter) = self.law.chapter_mut(slot) {
                        chapter.set_marker(marker);
                    }
                }
                None => tracing::debug!(text = %text, "Ignoring chapter-level text"),
            },
            Frame::Division(_) | Frame::Law => {
                if marker_run(&text).is_some() {
                    tracing::warn!(marker = %text, "Marker outside any chapter");
                }
            }
        }
    }
}

/// Marker carried by a `/.../` run, if the run follows the marker grammar.
fn marker_run(text: &str) -> Option<&str> {
    bracketed_marker(text).filter(|marker| parse_marker(Some(marker)).kind().is_some())
}
