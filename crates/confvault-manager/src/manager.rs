//! Configuration manager
//!
//! [`ConfigManager`] ties together location resolution, parsing, schema
//! validation, migration and persistence for one configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use confvault_document::{
    deep_merge, Format, RawDocument, Schema, StackSchema, ValidationError, VERSION_KEY,
    YamlFormat,
};
use confvault_migration::MigrationRegistry;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, LoadError, SaveError};
use crate::location::{ConfigLocations, ConfigScope};
use crate::options::StoreOptions;
use crate::persist;

/// Where a loaded document came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// No file (or an empty one); schema defaults were used
    Defaults,
    /// Parsed from a file
    File {
        /// Scope the file was found at
        scope: ConfigScope,
        /// File path
        path: PathBuf,
    },
}

/// A validated document with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<D> {
    /// Validated document
    pub document: D,
    /// Origin
    pub source: ConfigSource,
}

/// Versioned configuration store
///
/// Not safe for concurrent use against the same file; callers serialize
/// access per path.
#[derive(Debug)]
pub struct ConfigManager<S = StackSchema, F = YamlFormat> {
    schema: S,
    format: F,
    registry: MigrationRegistry,
    locations: ConfigLocations,
    options: StoreOptions,
    explicit_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create manager for the stack schema in YAML, with built-in migrations
    /// and locations from the environment
    #[must_use]
    pub fn new(options: StoreOptions) -> Self {
        let locations = ConfigLocations::from_env(&options);
        Self::from_parts(
            StackSchema::new(),
            YamlFormat,
            MigrationRegistry::with_defaults(),
            locations,
            options,
        )
    }
}

impl<S: Schema, F: Format> ConfigManager<S, F> {
    /// Create manager from explicit collaborators
    pub fn from_parts(
        schema: S,
        format: F,
        registry: MigrationRegistry,
        locations: ConfigLocations,
        options: StoreOptions,
    ) -> Self {
        if !format.matches_path(Path::new(&options.file_name)) {
            warn!(
                file_name = %options.file_name,
                format = format.name(),
                "configuration file name does not match the format's extensions"
            );
        }
        Self {
            schema,
            format,
            registry,
            locations,
            options,
            explicit_path: None,
        }
    }

    /// Pin the manager to one file, bypassing the scope search
    #[must_use]
    pub fn with_explicit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    /// Explicit path, if any
    #[inline]
    #[must_use]
    pub fn explicit_path(&self) -> Option<&Path> {
        self.explicit_path.as_deref()
    }

    /// Schema in use
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &S {
        &self.schema
    }

    /// Schema version documents are migrated to by default
    #[inline]
    #[must_use]
    pub fn current_version(&self) -> &str {
        self.schema.current_version()
    }

    /// Migration registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Mutable migration registry
    #[inline]
    pub fn registry_mut(&mut self) -> &mut MigrationRegistry {
        &mut self.registry
    }

    /// Store options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Scope directories
    #[inline]
    #[must_use]
    pub fn locations(&self) -> &ConfigLocations {
        &self.locations
    }

    /// Existing configuration file to load from
    ///
    /// With an explicit path only that path is considered.
    #[must_use]
    pub fn locate(&self) -> Option<(ConfigScope, PathBuf)> {
        match &self.explicit_path {
            Some(path) if path.exists() => Some((ConfigScope::Explicit, path.clone())),
            Some(_) => None,
            None => self.locations.find_existing(&self.options),
        }
    }

    /// Destination and scope for [`save`](Self::save)
    ///
    /// Precedence: explicit path, existing file, project scope, user scope.
    #[must_use]
    pub fn resolve_save_target(&self) -> (ConfigScope, PathBuf) {
        if let Some(path) = &self.explicit_path {
            return (ConfigScope::Explicit, path.clone());
        }
        if let Some(found) = self.locations.find_existing(&self.options) {
            return found;
        }
        match self.locations.project_file(&self.options) {
            Some(path) => (ConfigScope::Project, path),
            None => (ConfigScope::User, self.locations.user_file(&self.options)),
        }
    }

    /// Destination path for [`save`](Self::save)
    #[must_use]
    pub fn resolve_save_path(&self) -> PathBuf {
        self.resolve_save_target().1
    }

    /// Destination scope for [`save`](Self::save)
    #[must_use]
    pub fn resolve_save_scope(&self) -> ConfigScope {
        self.resolve_save_target().0
    }

    /// Backup location for the save destination
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        persist::backup_path(&self.resolve_save_path(), &self.options.backup_suffix)
    }

    /// Load and validate the configuration
    ///
    /// A missing or empty file yields the schema defaults.
    ///
    /// # Errors
    /// Returns error if an existing file cannot be read, parsed or validated
    pub fn load(&self) -> Result<S::Document, ConfigError> {
        Ok(self.load_with_source()?.document)
    }

    /// [`load`](Self::load), also reporting where the document came from
    ///
    /// # Errors
    /// Same as [`load`](Self::load)
    pub fn load_with_source(&self) -> Result<Loaded<S::Document>, ConfigError> {
        let Some((scope, path, raw)) = self.read_raw()? else {
            return Ok(self.defaults());
        };
        let document = self.validate_file(&path, &raw)?;
        Ok(Loaded {
            document,
            source: ConfigSource::File { scope, path },
        })
    }

    /// Load, migrating to `target_version` (default: the schema's version)
    ///
    /// When migration happens and `dry_run` is false, the file is backed up
    /// and the migrated document written back atomically. A dry run never
    /// touches disk or migration history.
    ///
    /// The migrated tree is written as-is, not through the typed model, so
    /// fields the current model does not know survive a partial migration to
    /// an older `target_version`.
    ///
    /// # Errors
    /// Returns error on load failure, migration failure, invalid migrated
    /// document or save failure
    pub fn load_and_migrate(
        &mut self,
        target_version: Option<&str>,
        dry_run: bool,
    ) -> Result<S::Document, ConfigError> {
        let target = target_version.unwrap_or(self.schema.current_version()).to_string();

        let Some((_, path, raw)) = self.read_raw()? else {
            return Ok(self.defaults().document);
        };
        // A present but non-text version is a schema error, not a missing one
        if raw.version().is_none() && raw.contains_key(VERSION_KEY) {
            return self.validate_file(&path, &raw);
        }
        if !self.registry.needs_migration(&raw, &target) {
            return self.validate_file(&path, &raw);
        }

        let migrated = self.registry.migrate(&raw, &target, dry_run)?;
        let document = self.validate_file(&path, &migrated)?;

        if dry_run {
            info!(path = %path.display(), to = %target, "dry run: migrated configuration not written");
            return Ok(document);
        }

        self.write_raw(&path, &migrated)?;
        info!(
            path = %path.display(),
            from = ?raw.version(),
            to = %target,
            "migrated configuration"
        );
        Ok(document)
    }

    /// Validate and atomically write `document` to the resolved save path
    ///
    /// # Errors
    /// Returns error if the document is invalid or the write fails; the
    /// existing file is never left partially written
    pub fn save(&self, document: &S::Document) -> Result<PathBuf, ConfigError> {
        let path = self.resolve_save_path();
        self.save_to(&path, document)?;
        Ok(path)
    }

    /// Validate and atomically write `document` to `path`
    ///
    /// Order: validate, serialize, ensure directory, back up, write.
    ///
    /// # Errors
    /// Same as [`save`](Self::save)
    pub fn save_to(&self, path: &Path, document: &S::Document) -> Result<(), ConfigError> {
        let raw = self.schema.to_raw(document)?;
        self.schema.validate(&raw)?;
        self.write_raw(path, &raw)
    }

    /// Validation messages for `document` (`path: message`); empty when valid
    #[must_use]
    pub fn validate(&self, document: &S::Document) -> Vec<String> {
        match self.schema.to_raw(document) {
            Ok(raw) => self.validate_raw(&raw),
            Err(e) => e.messages(),
        }
    }

    /// Validation messages for a raw document; empty when valid
    #[must_use]
    pub fn validate_raw(&self, raw: &RawDocument) -> Vec<String> {
        self.schema
            .validate(raw)
            .err()
            .map(|e| e.messages())
            .unwrap_or_default()
    }

    /// Deep-merge `overlay` onto `base` and validate the result
    ///
    /// Nested mappings merge recursively; any other overlay value replaces
    /// the base value. Keys only in `base` are kept.
    ///
    /// # Errors
    /// Returns error if the merged document is invalid
    pub fn merge_configs(
        &self,
        base: &S::Document,
        overlay: &RawDocument,
    ) -> Result<S::Document, ValidationError> {
        let base = self.schema.to_raw(base)?;
        let merged = deep_merge(&base, overlay);
        self.schema.validate(&merged)
    }

    /// Replace the configuration file with its backup
    ///
    /// The backup is validated first and kept afterwards.
    ///
    /// # Errors
    /// Returns error if no backup exists, it is invalid, or the write fails
    pub fn restore_backup(&self) -> Result<PathBuf, ConfigError> {
        let path = self.resolve_save_path();
        let backup = persist::backup_path(&path, &self.options.backup_suffix);
        if !backup.is_file() {
            return Err(SaveError::MissingBackup { backup }.into());
        }

        let text = fs::read_to_string(&backup).map_err(|e| LoadError::io_error(&backup, e))?;
        let raw = self
            .format
            .parse(&text)
            .map_err(|e| LoadError::parse_error(&backup, e))?
            .unwrap_or_default();
        if self.registry.needs_migration(&raw, self.schema.current_version()) {
            debug!(backup = %backup.display(), "restoring backup written by an older schema");
        } else {
            self.validate_file(&backup, &raw)?;
        }

        persist::atomic_write(&path, text.as_bytes())?;
        info!(path = %path.display(), backup = %backup.display(), "restored configuration from backup");
        Ok(path)
    }

    fn defaults(&self) -> Loaded<S::Document> {
        Loaded {
            document: self.schema.defaults(),
            source: ConfigSource::Defaults,
        }
    }

    fn read_raw(&self) -> Result<Option<(ConfigScope, PathBuf, RawDocument)>, LoadError> {
        let Some((scope, path)) = self.locate() else {
            info!(explicit = ?self.explicit_path, "no configuration file found, using defaults");
            return Ok(None);
        };

        let text = fs::read_to_string(&path).map_err(|e| LoadError::io_error(&path, e))?;
        match self
            .format
            .parse(&text)
            .map_err(|e| LoadError::parse_error(&path, e))?
        {
            Some(raw) => {
                debug!(path = %path.display(), %scope, "read configuration file");
                Ok(Some((scope, path, raw)))
            }
            None => {
                info!(path = %path.display(), "configuration file is empty, using defaults");
                Ok(None)
            }
        }
    }

    fn write_raw(&self, path: &Path, raw: &RawDocument) -> Result<(), ConfigError> {
        let text = self.format.render(raw).map_err(|source| SaveError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

        persist::ensure_parent_dir(path)?;
        persist::create_backup(path, &self.options.backup_suffix)?;
        persist::atomic_write(path, text.as_bytes())?;

        info!(path = %path.display(), format = self.format.name(), "saved configuration");
        Ok(())
    }

    fn validate_file(&self, path: &Path, raw: &RawDocument) -> Result<S::Document, ConfigError> {
        self.schema
            .validate(raw)
            .map_err(|source| ConfigError::Invalid {
                path: path.to_path_buf(),
                source,
            })
    }
}
