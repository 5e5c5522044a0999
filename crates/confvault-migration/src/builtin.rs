//! Built-in stack schema migrations
//!
//! - `1.0 -> 1.1`: adds the `monitoring` section
//! - `1.1 -> 1.2`: adds the `backup` section and renames
//!   `deployment.log_level` to `deployment.logging_level`

use std::sync::Arc;

use confvault_document::RawDocument;
use serde_json::Value;

use crate::error::TransformError;
use crate::migration::Migration;

/// Built-in migrations in chain order
#[must_use]
pub fn defaults() -> Vec<Arc<dyn Migration>> {
    vec![
        Arc::new(AddMonitoringSection),
        Arc::new(AddBackupAndRenameLogLevel),
    ]
}

/// `1.0 -> 1.1`: disabled `monitoring` section
#[derive(Debug, Clone, Copy, Default)]
pub struct AddMonitoringSection;

impl Migration for AddMonitoringSection {
    fn from_version(&self) -> &str {
        "1.0"
    }

    fn to_version(&self) -> &str {
        "1.1"
    }

    fn description(&self) -> &str {
        "Add monitoring section"
    }

    fn migrate(&self, mut document: RawDocument) -> Result<RawDocument, TransformError> {
        require_mapping(&document, "monitoring")?;
        document.set_path_if_absent("monitoring.enabled", Value::Bool(false));
        document.set_version(self.to_version());
        Ok(document)
    }
}

/// `1.1 -> 1.2`: disabled `backup` section, `log_level` renamed
#[derive(Debug, Clone, Copy, Default)]
pub struct AddBackupAndRenameLogLevel;

impl Migration for AddBackupAndRenameLogLevel {
    fn from_version(&self) -> &str {
        "1.1"
    }

    fn to_version(&self) -> &str {
        "1.2"
    }

    fn description(&self) -> &str {
        "Add backup section and rename deployment.log_level"
    }

    fn migrate(&self, mut document: RawDocument) -> Result<RawDocument, TransformError> {
        require_mapping(&document, "backup")?;
        require_mapping(&document, "deployment")?;

        document.set_path_if_absent("backup.enabled", Value::Bool(false));

        // An explicit logging_level wins over the legacy key
        if let Some(level) = document.remove_path("deployment.log_level") {
            document.set_path_if_absent("deployment.logging_level", level);
        }

        document.set_version(self.to_version());
        Ok(document)
    }
}

fn require_mapping(document: &RawDocument, key: &str) -> Result<(), TransformError> {
    match document.get(key) {
        None | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(TransformError::UnexpectedType {
            path: key.to_string(),
            expected: "mapping",
        }),
    }
}
