//! Error types for the document model
//!
//! - Version parsing
//! - Format parsing/rendering (text ↔ document)
//! - Schema validation (document → typed model)

use std::fmt::{self, Display, Formatter};

/// Errors while parsing a version string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// Version string was empty
    #[error("version string is empty")]
    Empty,

    /// Wrong number of dotted components
    #[error("version '{version}' has {count} components, expected 2 or 3")]
    ComponentCount { version: String, count: usize },

    /// Component is not a non-negative integer
    #[error("version '{version}' has non-numeric component '{component}'")]
    InvalidComponent { version: String, component: String },
}

/// Errors converting between text and documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// YAML syntax or encoding error
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON syntax or encoding error
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Top-level node is not a mapping
    #[error("document root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },
}

/// A single schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted field path (`<root>` for document-level issues)
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    /// Path used for issues that are not tied to a field
    pub const ROOT: &'static str = "<root>";

    /// Create new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            path: if path.is_empty() {
                Self::ROOT.to_string()
            } else {
                path
            },
            message: message.into(),
        }
    }
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Document failed schema validation
///
/// Always carries at least one [`ValidationIssue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", join_issues(.issues))]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Create from a list of issues
    #[must_use]
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Create from one issue
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue::new(path, message)])
    }

    /// All issues
    #[inline]
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues rendered as `path: message` strings
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
