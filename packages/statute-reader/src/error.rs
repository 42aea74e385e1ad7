//! Error types for the statute reader.
//!
//! Extraction is tolerant by nature: malformed markers, unknown elements and
//! unmatched lines are logged and skipped. Only the conditions below abort an
//! operation.

use thiserror::Error;

/// Main error type for the statute reader library.
#[derive(Debug, Error)]
pub enum StatuteError {
    /// The markup document has no container the extractor can walk.
    #[error("No statute container found in markup{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
    MissingRoot { context: Option<String> },

    /// Invalid date format.
    #[error("Invalid date format: '{0}'. Expected YYYY-MM-DD (e.g., 2028-07-01)")]
    InvalidDate(String),

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    YamlSerialization(#[from] serde_yaml_ng::Error),
}

/// Result type alias for statute reader operations.
pub type Result<T> = std::result::Result<T, StatuteError>;
