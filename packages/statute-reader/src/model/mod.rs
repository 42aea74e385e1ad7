//! Structural model of a statute.
//!
//! A [`Law`] holds divisions, which hold chapters, which hold paragraphs,
//! which hold parts. Chapters that appear before any division live directly
//! on the law. Both extractors build this tree; the temporal tools and the
//! reconciler only read it (the effective-date filter also drops variants).

mod paragraph;
mod part;

pub use paragraph::{Paragraph, VersionStatus};
pub use part::{Item, Part};

use serde::Serialize;

use crate::config::{AUTO_DIVISION_ID, AUTO_DIVISION_NAME};

/// Node types, ordered from least to most specific.
///
/// The extractors keep a stack of open nodes; closing "down to" a kind pops
/// every open node that is more specific than it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Law,
    Division,
    Subdivision,
    Chapter,
    Heading,
    Paragraph,
    Part,
    Reference,
    Directive,
}

/// Position of a chapter inside a [`Law`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterSlot {
    /// Chapter `chapter` of division `division`.
    InDivision { division: usize, chapter: usize },
    /// Chapter that belongs to no division.
    Unassigned(usize),
}

/// The root of an extracted statute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Law {
    pub name: String,
    pub id: String,
    pub divisions: Vec<Division>,
    /// Chapters that belong to no division.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chapters: Vec<Chapter>,
    /// Paragraphs lifted out of synthetic chapters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<Paragraph>,
}

impl Law {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            divisions: Vec::new(),
            chapters: Vec::new(),
            paragraphs: Vec::new(),
        }
    }

    /// Add a division and return its index.
    pub fn add_division(&mut self, division: Division) -> usize {
        tracing::debug!(division = %division.id, "Adding division");
        self.divisions.push(division);
        self.divisions.len() - 1
    }

    /// Add a chapter that belongs to no division.
    pub fn add_chapter(&mut self, chapter: Chapter) -> ChapterSlot {
        self.chapters.push(chapter);
        ChapterSlot::Unassigned(self.chapters.len() - 1)
    }

    /// Add a chapter to division `division`, or to the law itself when the
    /// index is out of range.
    pub fn add_chapter_to(&mut self, division: Option<usize>, chapter: Chapter) -> ChapterSlot {
        if let Some(index) = division.filter(|&index| index < self.divisions.len()) {
            let chapter = self.divisions[index].add_chapter(chapter);
            return ChapterSlot::InDivision {
                division: index,
                chapter,
            };
        }
        self.add_chapter(chapter)
    }

    /// Index of the division fabricated for content without structure,
    /// created on first use.
    pub fn auto_division(&mut self) -> usize {
        if let Some(index) = self.divisions.iter().position(Division::is_auto) {
            return index;
        }
        tracing::info!("Fabricating division for content outside any chapter");
        self.add_division(Division::new(AUTO_DIVISION_ID, AUTO_DIVISION_NAME))
    }

    #[must_use]
    pub fn chapter(&self, slot: ChapterSlot) -> Option<&Chapter> {
        match slot {
            ChapterSlot::InDivision { division, chapter } => {
                self.divisions.get(division)?.chapters.get(chapter)
            }
            ChapterSlot::Unassigned(chapter) => self.chapters.get(chapter),
        }
    }

    pub fn chapter_mut(&mut self, slot: ChapterSlot) -> Option<&mut Chapter> {
        match slot {
            ChapterSlot::InDivision { division, chapter } => {
                self.divisions.get_mut(division)?.chapters.get_mut(chapter)
            }
            ChapterSlot::Unassigned(chapter) => self.chapters.get_mut(chapter),
        }
    }

    pub fn paragraph_mut(&mut self, slot: ChapterSlot, paragraph: usize) -> Option<&mut Paragraph> {
        self.chapter_mut(slot)?.paragraphs.get_mut(paragraph)
    }

    /// Every chapter: division chapters in order, then unassigned ones.
    pub fn chapters(&self) -> impl Iterator<Item = &Chapter> {
        self.divisions
            .iter()
            .flat_map(|d| d.chapters.iter())
            .chain(self.chapters.iter())
    }

    pub fn chapters_mut(&mut self) -> impl Iterator<Item = &mut Chapter> {
        self.divisions
            .iter_mut()
            .flat_map(|d| d.chapters.iter_mut())
            .chain(self.chapters.iter_mut())
    }

    /// All variants numbered `paragraph_id` in chapter `chapter_id`.
    #[must_use]
    pub fn find_paragraphs(&self, chapter_id: &str, paragraph_id: &str) -> Vec<&Paragraph> {
        self.chapters()
            .filter(|c| c.id == chapter_id)
            .flat_map(|c| c.paragraphs.iter())
            .filter(|p| p.id == paragraph_id)
            .collect()
    }

    /// Number of paragraph variants across all chapters.
    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.chapters().map(|c| c.paragraphs.len()).sum()
    }

    /// Prune every paragraph, then drop paragraphs left without parts.
    ///
    /// Surviving paragraphs keep their order.
    pub fn prune(&mut self) {
        for chapter in self.chapters_mut() {
            for paragraph in &mut chapter.paragraphs {
                paragraph.prune();
            }
            let before = chapter.paragraphs.len();
            chapter.paragraphs.retain(|p| !p.parts.is_empty());
            if chapter.paragraphs.len() < before {
                tracing::debug!(
                    chapter = %chapter.id,
                    dropped = before - chapter.paragraphs.len(),
                    "Dropped paragraphs without text"
                );
            }
        }
    }

    /// Lift the paragraphs of synthetic chapters onto the law and drop those
    /// chapters.
    ///
    /// For statutes without chapters, where the extractor had to invent one.
    pub fn materialize_synthetic_chapters(&mut self) {
        let mut lifted = Vec::new();
        for division in &mut self.divisions {
            take_synthetic(&mut division.chapters, &mut lifted);
        }
        take_synthetic(&mut self.chapters, &mut lifted);
        self.paragraphs.extend(lifted);
        self.divisions
            .retain(|d| !(d.is_auto() && d.chapters.is_empty()));
    }
}

fn take_synthetic(chapters: &mut Vec<Chapter>, lifted: &mut Vec<Paragraph>) {
    let (synthetic, kept): (Vec<_>, Vec<_>) =
        std::mem::take(chapters).into_iter().partition(|c| c.synthetic);
    *chapters = kept;
    for chapter in synthetic {
        lifted.extend(chapter.paragraphs);
    }
}

/// A lettered division ("AVD. A").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Division {
    pub id: String,
    pub name: String,
    pub chapters: Vec<Chapter>,
    /// Subdivision that tags chapters added from now on.
    #[serde(skip)]
    current_subdivision: Option<Subdivision>,
}

impl Division {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            chapters: Vec::new(),
            current_subdivision: None,
        }
    }

    fn is_auto(&self) -> bool {
        self.id == AUTO_DIVISION_ID && self.name == AUTO_DIVISION_NAME
    }

    pub fn set_current_subdivision(&mut self, subdivision: Subdivision) {
        tracing::debug!(division = %self.id, subdivision = %subdivision.id, "Entering subdivision");
        self.current_subdivision = Some(subdivision);
    }

    /// Add a chapter, tagging it with this division and the current
    /// subdivision. Returns the chapter's index.
    pub fn add_chapter(&mut self, mut chapter: Chapter) -> usize {
        if self.chapters.iter().any(|c| c.id == chapter.id) {
            tracing::warn!(division = %self.id, chapter = %chapter.id, "Duplicate chapter number in division");
        }
        chapter.division = Some(self.id.clone());
        chapter.subdivision = self.current_subdivision.clone();
        self.chapters.push(chapter);
        self.chapters.len() - 1
    }
}

/// A roman-numbered grouping of chapters inside a division ("II").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subdivision {
    pub id: String,
    pub name: String,
}

impl Subdivision {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Whether a chapter holds regular or transitional provisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterKind {
    #[default]
    Regular,
    Transitional,
}

/// Heading text waiting to be attached to the next paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub title: String,
}

impl Heading {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// An amendment citation such as "Lag (2018:1233)."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub text: String,
}

/// An editorial instruction in the markup, starting with "/".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub text: String,
}

/// A numbered chapter ("3 a kap.").
///
/// Up to two headings are collected ahead of a paragraph: a heading
/// directly followed by another becomes heading and sub-heading. A heading
/// that arrives after a paragraph replaces the sub-heading when there is
/// one, and starts over otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub id: String,
    pub name: String,
    pub kind: ChapterKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<Subdivision>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
    pub paragraphs: Vec<Paragraph>,
    #[serde(skip)]
    headings: Vec<Heading>,
    #[serde(skip)]
    heading_just_set: bool,
}

impl Chapter {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A chapter the extractor had to invent.
    #[must_use]
    pub fn synthetic(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(id, name)
        }
    }

    #[must_use]
    pub fn transitional(id: impl Into<String>, name: impl Into<String>, synthetic: bool) -> Self {
        Self {
            kind: ChapterKind::Transitional,
            synthetic,
            ..Self::new(id, name)
        }
    }

    pub fn set_marker(&mut self, raw: &str) {
        let raw = raw.trim();
        self.marker = (!raw.is_empty()).then(|| raw.to_string());
        self.heading_just_set = false;
    }

    /// Collect a heading for the paragraphs that follow.
    pub fn push_heading(&mut self, heading: Heading) {
        // Heuristic: a new top heading stacked after two others is read as a sub-heading.
        if self.headings.len() > 1 {
            self.headings.pop();
        } else if !self.heading_just_set {
            self.headings.clear();
        }
        self.headings.push(heading);
        self.heading_just_set = true;
    }

    /// Add a paragraph and return its index.
    ///
    /// Regular chapters hand their collected headings to the paragraph.
    pub fn add_paragraph(&mut self, mut paragraph: Paragraph) -> usize {
        if self.kind == ChapterKind::Regular {
            paragraph.apply_headings(&self.headings);
        }
        self.heading_just_set = false;
        self.paragraphs.push(paragraph);
        self.paragraphs.len() - 1
    }
}
