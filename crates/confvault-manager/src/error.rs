//! Error types for the configuration manager
//!
//! - Load operations (file → raw document)
//! - Save operations (document → file)
//! - Combined [`ConfigError`] for the public API

use std::path::PathBuf;

use confvault_document::{DocumentError, ValidationError};
use confvault_migration::MigrationError;

/// Errors reading an existing configuration file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File exists but cannot be read
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File contents cannot be parsed
    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create parse error for path
    pub fn parse_error(path: impl Into<PathBuf>, source: DocumentError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Errors writing a configuration file
///
/// None of these leave the destination file modified.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// Destination directory cannot be created
    #[error("cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backup copy failed
    #[error("cannot back up {} to {}: {source}", .path.display(), .backup.display())]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document cannot be rendered
    #[error("cannot serialize configuration for {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// Temporary file cannot be created
    #[error("cannot create temporary file in {}: {source}", .dir.display())]
    TempFile {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the temporary file failed
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Flushing to stable storage failed
    #[error("cannot sync {}: {source}", .path.display())]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Restricting permissions failed
    #[error("cannot set permissions on {}: {source}", .path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Final rename onto the destination failed
    #[error("cannot replace {}: {source}", .path.display())]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No backup exists to restore from
    #[error("no backup found at {}", .backup.display())]
    MissingBackup { backup: PathBuf },
}

/// Combined error for [`ConfigManager`](crate::ConfigManager) operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Existing file unreadable or unparsable
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// File contents failed schema validation
    #[error("invalid configuration in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    /// In-memory document failed schema validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Write failed
    #[error("save error: {0}")]
    Save(#[from] SaveError),

    /// Migration chain failed
    #[error("migration error: {0}")]
    Migration(#[from] MigrationError),
}

impl ConfigError {
    /// Validation error behind this failure, if any
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Invalid { source, .. } | Self::Validation(source) => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn load_error_keeps_cause() {
        let err = LoadError::io_error(
            "/etc/confvault/config.yaml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            err.to_string(),
            "io error reading /etc/confvault/config.yaml: denied"
        );
        assert!(err.source().is_some());

        let wrapped = ConfigError::from(err);
        assert!(wrapped.to_string().starts_with("load error: "));
        assert!(wrapped.validation().is_none());
    }

    #[test]
    fn invalid_file_exposes_validation() {
        let err = ConfigError::Invalid {
            path: PathBuf::from("config.yaml"),
            source: ValidationError::single("monitoring.interval_seconds", "must be >= 1"),
        };
        assert_eq!(
            err.validation().map(ValidationError::messages),
            Some(vec!["monitoring.interval_seconds: must be >= 1".to_string()])
        );
    }
}
