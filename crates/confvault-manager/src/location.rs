//! Configuration file locations
//!
//! Two scopes are searched: project-local (only when the project directory
//! variable is set) and user-global. An explicit path bypasses both.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::options::StoreOptions;

/// Precedence tier a configuration file was resolved at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    /// Path given to the manager directly
    Explicit,
    /// `<project>/<project_subdir>/<file_name>`
    Project,
    /// `<user_dir>/<file_name>`
    User,
}

impl Display for ConfigScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit"),
            Self::Project => f.write_str("project"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Scope directories for one store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocations {
    project_dir: Option<PathBuf>,
    user_dir: PathBuf,
}

impl ConfigLocations {
    /// Create from explicit directories
    pub fn new(project_dir: Option<PathBuf>, user_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir: user_dir.into(),
        }
    }

    /// Resolve directories from the environment
    ///
    /// Project scope is active only when `options.project_dir_env` is set
    /// to a non-empty value.
    #[must_use]
    pub fn from_env(options: &StoreOptions) -> Self {
        let project_dir = std::env::var_os(&options.project_dir_env)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let user_dir = options.user_dir.clone().unwrap_or_else(default_user_dir);
        debug!(
            project_dir = ?project_dir,
            user_dir = %user_dir.display(),
            "resolved configuration locations"
        );
        Self::new(project_dir, user_dir)
    }

    /// Project root, if project scope is active
    #[inline]
    #[must_use]
    pub fn project_dir(&self) -> Option<&Path> {
        self.project_dir.as_deref()
    }

    /// User-global directory
    #[inline]
    #[must_use]
    pub fn user_dir(&self) -> &Path {
        &self.user_dir
    }

    /// Project-scope file path
    #[must_use]
    pub fn project_file(&self, options: &StoreOptions) -> Option<PathBuf> {
        self.project_dir.as_ref().map(|dir| {
            dir.join(&options.project_subdir)
                .join(&options.file_name)
        })
    }

    /// User-scope file path
    #[must_use]
    pub fn user_file(&self, options: &StoreOptions) -> PathBuf {
        self.user_dir.join(&options.file_name)
    }

    /// Search candidates in precedence order
    #[must_use]
    pub fn candidates(&self, options: &StoreOptions) -> Vec<(ConfigScope, PathBuf)> {
        let mut candidates = Vec::with_capacity(2);
        if let Some(project) = self.project_file(options) {
            candidates.push((ConfigScope::Project, project));
        }
        candidates.push((ConfigScope::User, self.user_file(options)));
        candidates
    }

    /// First candidate that exists on disk
    #[must_use]
    pub fn find_existing(&self, options: &StoreOptions) -> Option<(ConfigScope, PathBuf)> {
        self.candidates(options)
            .into_iter()
            .find(|(_, path)| path.is_file())
    }
}

/// Platform user configuration directory
///
/// `<config_dir>/confvault`, falling back to `~/.confvault`, then to a
/// relative `.confvault`.
#[must_use]
pub fn default_user_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("confvault");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".confvault");
    }
    PathBuf::from(DEFAULT_DIR_NAME)
}

const DEFAULT_DIR_NAME: &str = ".confvault";
