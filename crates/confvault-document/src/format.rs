//! Serialization formats
//!
//! [`Format`] converts between file text and [`RawDocument`]. The store only
//! depends on the trait, so the on-disk encoding is swappable.

use std::fmt::Debug;
use std::path::Path;

use serde_json::Value;

use crate::document::RawDocument;
use crate::error::DocumentError;

/// Text encoding for configuration documents
pub trait Format: Debug + Send + Sync {
    /// Format name for diagnostics
    fn name(&self) -> &'static str;

    /// Conventional file extensions
    fn extensions(&self) -> &[&'static str];

    /// Whether `path` carries one of this format's extensions (any case)
    fn matches_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Parse file text
    ///
    /// Returns `Ok(None)` when the text holds no data (empty, whitespace,
    /// comments only, or an explicit null document).
    ///
    /// # Errors
    /// Returns error on syntax errors or a non-mapping root
    fn parse(&self, text: &str) -> Result<Option<RawDocument>, DocumentError>;

    /// Render a document to text
    ///
    /// # Errors
    /// Returns error if the encoder rejects the document
    fn render(&self, document: &RawDocument) -> Result<String, DocumentError>;
}

/// YAML format (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl Format for YamlFormat {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn extensions(&self) -> &[&'static str] {
        &["yaml", "yml"]
    }

    fn parse(&self, text: &str) -> Result<Option<RawDocument>, DocumentError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_yaml::from_str(text)?;
        into_document(value)
    }

    fn render(&self, document: &RawDocument) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(document)?)
    }
}

/// JSON format
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn parse(&self, text: &str) -> Result<Option<RawDocument>, DocumentError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(text)?;
        into_document(value)
    }

    fn render(&self, document: &RawDocument) -> Result<String, DocumentError> {
        let mut text = serde_json::to_string_pretty(document)?;
        text.push('\n');
        Ok(text)
    }
}

fn into_document(value: Value) -> Result<Option<RawDocument>, DocumentError> {
    match value {
        Value::Null => Ok(None),
        other => RawDocument::from_value(other).map(Some),
    }
}
