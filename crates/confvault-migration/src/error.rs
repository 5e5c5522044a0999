//! Error types for the migration layer
//!
//! - Registration (argument errors)
//! - Path discovery
//! - Before/after guards
//! - Transformation bodies
//! - Chain execution (wraps the failing step)

use std::fmt::{self, Display, Formatter};

use confvault_document::VersionError;

use crate::migration::MigrationId;

/// Which side of a migration a guard checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    /// Input document, checked against `from_version`
    Before,
    /// Output document, checked against `to_version`
    After,
}

impl Display for GuardPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => f.write_str("before"),
            Self::After => f.write_str("after"),
        }
    }
}

/// A migration's version invariant was violated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// Document carries no `version` field
    #[error("{migration}: document has no version field {phase} migration")]
    MissingVersion {
        phase: GuardPhase,
        migration: MigrationId,
    },

    /// Document version differs from the one the migration expects
    #[error("{migration}: expected version {expected} {phase} migration, found {found}")]
    VersionMismatch {
        phase: GuardPhase,
        migration: MigrationId,
        expected: String,
        found: String,
    },
}

/// Errors raised by a migration body
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// A section the migration depends on is absent
    #[error("missing section '{0}'")]
    MissingSection(String),

    /// A value has the wrong shape
    #[error("'{path}' must be a {expected}")]
    UnexpectedType { path: String, expected: &'static str },

    /// Migration-specific failure
    #[error("{0}")]
    Custom(String),
}

impl TransformError {
    /// Create custom error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Rejected registration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// `from_version` or `to_version` is empty
    #[error("migration has an empty {side} version")]
    MissingVersion { side: &'static str },

    /// Version string does not parse
    #[error("migration version '{version}' is malformed: {source}")]
    MalformedVersion {
        version: String,
        #[source]
        source: VersionError,
    },

    /// `from_version` equals `to_version`
    #[error("migration from {version} to itself")]
    SelfLoop { version: String },

    /// Edge already registered
    #[error("migration {from} -> {to} is already registered")]
    Duplicate { from: String, to: String },
}

/// Chain discovery failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Endpoint does not parse
    #[error("invalid version '{version}': {source}")]
    InvalidVersion {
        version: String,
        #[source]
        source: VersionError,
    },

    /// Target is older than source
    #[error("cannot migrate from {from} down to {to}; downgrades are not supported")]
    Downgrade { from: String, to: String },

    /// Versions are not connected
    #[error("no migration path from {from} to {to}")]
    NoPath { from: String, to: String },
}

/// Cause of a failed chain step
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepFailure {
    /// Before/after guard rejected the document
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// Migration body failed
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// Errors from [`MigrationRegistry::migrate`](crate::MigrationRegistry::migrate)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// Input document carries no `version` field
    #[error("document has no version field")]
    MissingVersion,

    /// Chain could not be resolved
    #[error(transparent)]
    Path(#[from] PathError),

    /// Step `step` (1-based) of `total` failed; nothing was applied
    #[error("migration step {step} of {total} ({from} -> {to}) failed: {cause}")]
    StepFailed {
        step: usize,
        total: usize,
        from: String,
        to: String,
        #[source]
        cause: StepFailure,
    },
}

impl MigrationError {
    /// Check if this is a validation failure (missing version or guard)
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingVersion
                | Self::StepFailed {
                    cause: StepFailure::Guard(_),
                    ..
                }
        )
    }

    /// Guard error behind a failed step, if any
    #[must_use]
    pub fn guard_error(&self) -> Option<&GuardError> {
        match self {
            Self::StepFailed {
                cause: StepFailure::Guard(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}
