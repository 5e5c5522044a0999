//! Migration units and their version guards

use std::fmt::{self, Debug, Display, Formatter};

use confvault_document::{RawDocument, Version};
use serde::{Deserialize, Serialize};

use crate::error::{GuardError, GuardPhase, TransformError};

/// A single version-to-version transformation
///
/// Implementations are stateless; one instance serves every invocation.
/// `migrate` receives a private copy of the document and must stamp
/// `to_version` into the result without dropping unrelated fields.
pub trait Migration: Send + Sync {
    /// Version this migration applies to
    fn from_version(&self) -> &str;

    /// Version this migration produces
    fn to_version(&self) -> &str;

    /// Human-readable summary
    fn description(&self) -> &str {
        ""
    }

    /// Transform the document
    ///
    /// # Errors
    /// Returns error if the document cannot be transformed
    fn migrate(&self, document: RawDocument) -> Result<RawDocument, TransformError>;

    /// Identity of this migration
    fn id(&self) -> MigrationId {
        MigrationId::new(self.from_version(), self.to_version())
    }
}

impl Debug for dyn Migration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Migration({})", self.id())
    }
}

/// `(from_version, to_version)` pair identifying a migration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MigrationId {
    /// Source version
    pub from: String,
    /// Target version
    pub to: String,
}

impl MigrationId {
    /// Create new id
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Display for MigrationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Check that `document` is at the migration's `from` version
///
/// # Errors
/// Returns error if the version is absent or differs
pub fn validate_before(migration: &MigrationId, document: &RawDocument) -> Result<(), GuardError> {
    check_version(GuardPhase::Before, migration, &migration.from, document)
}

/// Check that `document` is at the migration's `to` version
///
/// # Errors
/// Returns error if the version is absent or differs
pub fn validate_after(migration: &MigrationId, document: &RawDocument) -> Result<(), GuardError> {
    check_version(GuardPhase::After, migration, &migration.to, document)
}

fn check_version(
    phase: GuardPhase,
    migration: &MigrationId,
    expected: &str,
    document: &RawDocument,
) -> Result<(), GuardError> {
    let Some(found) = document.version() else {
        return Err(GuardError::MissingVersion {
            phase,
            migration: migration.clone(),
        });
    };
    if Version::same(&found, expected) {
        Ok(())
    } else {
        Err(GuardError::VersionMismatch {
            phase,
            migration: migration.clone(),
            expected: expected.to_string(),
            found,
        })
    }
}

/// Closure-backed [`Migration`]
///
/// # Example
/// ```rust,ignore
/// let migration = FnMigration::new("2.0", "2.1", |mut doc| {
///     doc.set_path_if_absent("cache.ttl", json!(300));
///     Ok(doc.with_version("2.1"))
/// })
/// .with_description("Add cache TTL");
/// ```
pub struct FnMigration<F> {
    from: String,
    to: String,
    description: String,
    transform: F,
}

impl<F> FnMigration<F>
where
    F: Fn(RawDocument) -> Result<RawDocument, TransformError> + Send + Sync,
{
    /// Create migration from a transform function
    pub fn new(from: impl Into<String>, to: impl Into<String>, transform: F) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            description: String::new(),
            transform,
        }
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl<F> Debug for FnMigration<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnMigration")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<F> Migration for FnMigration<F>
where
    F: Fn(RawDocument) -> Result<RawDocument, TransformError> + Send + Sync,
{
    fn from_version(&self) -> &str {
        &self.from
    }

    fn to_version(&self) -> &str {
        &self.to
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn migrate(&self, document: RawDocument) -> Result<RawDocument, TransformError> {
        (self.transform)(document)
    }
}
