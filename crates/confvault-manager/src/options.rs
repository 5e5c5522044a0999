//! Store options

use std::path::PathBuf;

/// Default configuration file name
pub const DEFAULT_FILE_NAME: &str = "config.yaml";

/// Default directory under the project root
pub const DEFAULT_PROJECT_SUBDIR: &str = ".confvault";

/// Default suffix appended to backups
pub const DEFAULT_BACKUP_SUFFIX: &str = ".backup";

/// Default environment variable naming the project directory
pub const DEFAULT_PROJECT_DIR_ENV: &str = "CONFVAULT_PROJECT_DIR";

/// Naming and location settings for a configuration store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// File name inside each scope directory
    pub file_name: String,
    /// Directory under the project root holding the project file
    pub project_subdir: String,
    /// Suffix appended to the file name for backups
    pub backup_suffix: String,
    /// Environment variable designating project scope
    pub project_dir_env: String,
    /// User-global directory (`None` uses the platform default)
    pub user_dir: Option<PathBuf>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_FILE_NAME.to_string(),
            project_subdir: DEFAULT_PROJECT_SUBDIR.to_string(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            project_dir_env: DEFAULT_PROJECT_DIR_ENV.to_string(),
            user_dir: None,
        }
    }
}

impl StoreOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set file name
    #[must_use]
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    /// Set project subdirectory
    #[must_use]
    pub fn with_project_subdir(mut self, subdir: impl Into<String>) -> Self {
        self.project_subdir = subdir.into();
        self
    }

    /// Set backup suffix
    #[must_use]
    pub fn with_backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.backup_suffix = suffix.into();
        self
    }

    /// Set project directory variable
    #[must_use]
    pub fn with_project_dir_env(mut self, var: impl Into<String>) -> Self {
        self.project_dir_env = var.into();
        self
    }

    /// Set user-global directory
    #[must_use]
    pub fn with_user_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_dir = Some(dir.into());
        self
    }
}
