//! Migration audit records

use std::fmt::Display;

use chrono::{DateTime, Utc};
use confvault_document::DocumentDiff;
use serde::{Deserialize, Serialize};

use crate::migration::MigrationId;

/// Record of one executed or attempted migration step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationHistory {
    /// Source version
    pub from_version: String,
    /// Target version
    pub to_version: String,
    /// When the step finished
    pub timestamp: DateTime<Utc>,
    /// Whether the step succeeded
    pub success: bool,
    /// Changes made by the step (empty on failure)
    pub changes: DocumentDiff,
    /// Failure description
    pub error: Option<String>,
}

impl MigrationHistory {
    /// Record a successful step
    #[must_use]
    pub fn succeeded(migration: &MigrationId, changes: DocumentDiff) -> Self {
        Self {
            from_version: migration.from.clone(),
            to_version: migration.to.clone(),
            timestamp: Utc::now(),
            success: true,
            changes,
            error: None,
        }
    }

    /// Record a failed step
    #[must_use]
    pub fn failed(migration: &MigrationId, error: &impl Display) -> Self {
        Self {
            from_version: migration.from.clone(),
            to_version: migration.to.clone(),
            timestamp: Utc::now(),
            success: false,
            changes: DocumentDiff::default(),
            error: Some(error.to_string()),
        }
    }

    /// Identity of the recorded migration
    #[must_use]
    pub fn migration(&self) -> MigrationId {
        MigrationId::new(&self.from_version, &self.to_version)
    }
}
