//! Statute reader - Extract statutes from markup and plain text.
//!
//! A statute is published twice: as XHTML and as plain text. This crate
//! reads either rendering into the same tree (divisions, chapters,
//! paragraphs and their parts), resolves the paragraph variants that apply
//! on a given date, and compares the two renderings with each other.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use statute_reader::{apply_effective_date, extract_from_text};
//!
//! let lines = [
//!     "1 kap. Inledande bestämmelser",
//!     "1 § /Upphör att gälla U:2025-07-01/ Gammal lydelse.",
//!     "1 § /Träder i kraft I:2025-07-01/ Ny lydelse.",
//! ];
//! let mut law = extract_from_text(lines, "Testlag", "2024:1").unwrap();
//! assert_eq!(law.find_paragraphs("1", "1").len(), 2);
//!
//! let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//! let report = apply_effective_date(&mut law, date);
//! assert_eq!(report.selected_variants, 1);
//! assert_eq!(law.find_paragraphs("1", "1")[0].flattened_text(), "Ny lydelse.");
//! ```
//!
//! # Architecture
//!
//! - [`model`]: The statute tree and its pruning rules
//! - [`marker`]: Grammar of effective-date markers
//! - [`markup`]: Extraction from the XHTML rendering
//! - [`text`]: Extraction from the plain-text rendering
//! - [`temporal`]: Effective-date filter, marker validation and schedule
//! - [`reconcile`]: Comparison of both renderings
//! - [`normalize`]: Whitespace, Unicode and snippet helpers
//! - [`config`]: Constants and input validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod marker;
pub mod markup;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod temporal;
pub mod text;

// Re-export the extraction entry points
pub use markup::{extract_from_markup, extract_from_xhtml};
pub use text::{extract_from_reader, extract_from_text};

// Re-export commonly used items
pub use config::validate_date;
pub use error::{Result, StatuteError};
pub use marker::{parse_marker, MarkerKind, MarkerStatus};
pub use model::{Chapter, Law, Paragraph, Part};
pub use reconcile::{reconcile, ReconciliationResult};
pub use temporal::{apply_effective_date, build_schedule, validate_markers};
