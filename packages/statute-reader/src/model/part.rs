//! Parts (numbered sub-paragraphs) and the items inside them.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Item token at the start of a line: "-", "7.", "8 a.", "b.".
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<dash>-)\s|(?P<number>\d+(?:\s?[a-z])?\.|[a-z]\.)\s)").expect("valid regex")
});

/// Item token of `line`, if the line starts a list item.
fn item_token(line: &str) -> Option<String> {
    let caps = ITEM_PATTERN.captures(line)?;
    caps.name("dash")
        .or_else(|| caps.name("number"))
        .map(|m| m.as_str().to_string())
}

fn starts_with_uppercase(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_uppercase)
}

/// A list item within a [`Part`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub number: usize,
    /// Token as printed: "-", "7.", "8 a.".
    pub token: String,
    /// Full text, token included, with continuation lines appended.
    pub text: String,
}

impl Item {
    fn append(&mut self, line: &str) {
        self.text.push(' ');
        self.text.push_str(line);
    }
}

/// A numbered sub-paragraph.
///
/// Lines are appended in order. Lines that start a list item also open an
/// [`Item`]; later plain lines continue the last item. Once a part is
/// itemized, a plain line starting with an uppercase letter does not belong
/// to it: it is held back and handed to the next part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Part {
    pub number: usize,
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Item>,
    #[serde(skip)]
    itemized: bool,
    #[serde(skip)]
    held: Vec<String>,
}

impl Part {
    #[must_use]
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// Open the part after `previous`, taking over the text it held back.
    #[must_use]
    pub fn following(previous: &mut Part) -> Self {
        let mut part = Self::new(previous.number + 1);
        for line in std::mem::take(&mut previous.held) {
            part.add_line(line);
        }
        part
    }

    /// Append a line of body text.
    pub fn add_line(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.is_empty() {
            return;
        }

        // A lone full stop closes the previous line.
        if line == "." {
            if let Some(last) = self.held.last_mut().or(self.lines.last_mut()) {
                last.push('.');
                return;
            }
        }

        // Held text stays contiguous: every later line goes to the next part too,
        // items and lowercase continuations included.
        if !self.held.is_empty() {
            self.held.push(line);
            return;
        }

        let token = item_token(&line);
        let continues_items = self.itemized && token.is_none();
        if continues_items && starts_with_uppercase(&line) {
            tracing::debug!(line = %line, "Holding text for the next part");
            self.held.push(line);
            return;
        }

        if let Some(token) = token {
            self.itemized = true;
            self.items.push(Item {
                number: self.items.len() + 1,
                token,
                text: line.clone(),
            });
        } else if continues_items {
            if let Some(item) = self.items.last_mut() {
                item.append(&line);
            }
        }
        self.lines.push(line);
    }

    /// No body text yet. Held text does not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn has_held_text(&self) -> bool {
        !self.held.is_empty()
    }

    /// Body text as one line.
    #[must_use]
    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }

    /// Drop lines that are blank after trimming.
    pub fn prune(&mut self) {
        self.lines.retain(|line| !line.trim().is_empty());
    }
}
