//! Structural diffs between documents
//!
//! Documents are compared key by key at the top level. Each value, nested
//! mappings included, is compared as a whole.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::document::RawDocument;

/// Added, modified and removed top-level keys between two documents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDiff {
    /// Keys only present after
    pub added: Vec<String>,
    /// Keys present on both sides with different values
    pub modified: Vec<String>,
    /// Keys only present before
    pub removed: Vec<String>,
}

impl DocumentDiff {
    /// Check if nothing changed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

impl Display for DocumentDiff {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "  (no changes)");
        }
        for path in &self.added {
            writeln!(f, "  + {path}")?;
        }
        for path in &self.modified {
            writeln!(f, "  ~ {path}")?;
        }
        for path in &self.removed {
            writeln!(f, "  - {path}")?;
        }
        Ok(())
    }
}

/// Compute the diff from `before` to `after`
///
/// Partitions top-level keys: a key whose nested content changed is
/// `modified`, not split into leaf paths. Read-only; keys are reported in
/// document order.
#[must_use]
pub fn compute_diff(before: &RawDocument, after: &RawDocument) -> DocumentDiff {
    let (before, after) = (before.as_map(), after.as_map());

    let mut diff = DocumentDiff::default();
    for (key, after_val) in after {
        match before.get(key) {
            None => diff.added.push(key.clone()),
            Some(before_val) if before_val != after_val => diff.modified.push(key.clone()),
            Some(_) => {}
        }
    }
    diff.removed = before
        .keys()
        .filter(|key| !after.contains_key(*key))
        .cloned()
        .collect();
    diff
}
