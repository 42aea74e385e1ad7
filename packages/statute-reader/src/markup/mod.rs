//! Structural extraction from the markup (XHTML) rendering of a statute.
//!
//! The extractor only needs a small view of the document: element names,
//! attributes, text runs and children. That view is the [`MarkupNode`]
//! trait, implemented here for [`roxmltree::Node`].

mod extractor;

pub use extractor::extract_from_markup;

use roxmltree::{Document, Node, ParsingOptions};

use crate::error::Result;
use crate::model::Law;

/// Read-only view of a markup node.
pub trait MarkupNode: Copy {
    /// Local element name, `None` for text and other nodes.
    fn element_name(&self) -> Option<&str>;

    fn attribute_value(&self, name: &str) -> Option<&str>;

    /// Own text of a text node, `None` for everything else.
    fn text_run(&self) -> Option<&str>;

    /// All descendant text, concatenated in document order.
    fn text_content(&self) -> String;

    fn child_nodes(&self) -> Vec<Self>;

    /// Whether the `class` attribute lists `class`.
    fn has_class(&self, class: &str) -> bool {
        self.attribute_value("class")
            .is_some_and(|value| value.split_whitespace().any(|c| c.eq_ignore_ascii_case(class)))
    }

    fn is_tag(&self, name: &str) -> bool {
        self.element_name()
            .is_some_and(|element| element.eq_ignore_ascii_case(name))
    }
}

impl<'a, 'input: 'a> MarkupNode for Node<'a, 'input> {
    fn element_name(&self) -> Option<&str> {
        if self.is_element() {
            Some(self.tag_name().name())
        } else {
            None
        }
    }

    fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name)
    }

    fn text_run(&self) -> Option<&str> {
        if self.is_text() {
            self.text()
        } else {
            None
        }
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.children().collect()
    }
}

/// HTML named entities seen in statute markup, with their XML numeric form.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", "&#160;"),
    ("&sect;", "&#167;"),
    ("&ndash;", "&#8211;"),
    ("&mdash;", "&#8212;"),
    ("&aring;", "&#229;"),
    ("&auml;", "&#228;"),
    ("&ouml;", "&#246;"),
    ("&Aring;", "&#197;"),
    ("&Auml;", "&#196;"),
    ("&Ouml;", "&#214;"),
    ("&eacute;", "&#233;"),
    ("&uuml;", "&#252;"),
];

/// Make XHTML acceptable to an XML parser.
///
/// Replaces HTML named entities with numeric references and closes bare
/// `<br>` tags.
#[must_use]
pub fn prepare_xhtml(input: &str) -> String {
    let mut prepared = input.replace("<br>", "<br/>");
    for (named, numeric) in NAMED_ENTITIES {
        if prepared.contains(named) {
            prepared = prepared.replace(named, numeric);
        }
    }
    prepared
}

/// Parse prepared XHTML. DOCTYPE declarations are allowed.
pub fn parse_xhtml(prepared: &str) -> Result<Document<'_>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Ok(Document::parse_with_options(prepared, options)?)
}

/// Extract a statute from an XHTML document.
///
/// # Arguments
/// * `input` - The XHTML source
/// * `law_name` - Name stored on the resulting law
/// * `law_id` - Identifier stored on the resulting law
///
/// # Examples
/// ```
/// use statute_reader::markup::extract_from_xhtml;
///
/// let xhtml = r#"<html><body><div>
///   <h3>1 kap. Inledande bestämmelser</h3>
///   <a class="paragraf" name="K1P1"><b>1 §</b></a> Denna lag gäller.
/// </div></body></html>"#;
/// let law = extract_from_xhtml(xhtml, "Testlag", "2024:1").unwrap();
/// let paragraphs = law.find_paragraphs("1", "1");
/// assert_eq!(paragraphs[0].flattened_text(), "Denna lag gäller.");
/// ```
pub fn extract_from_xhtml(input: &str, law_name: &str, law_id: &str) -> Result<Law> {
    let prepared = prepare_xhtml(input);
    let document = parse_xhtml(&prepared)?;
    extract_from_markup(document.root(), law_name, law_id)
}
