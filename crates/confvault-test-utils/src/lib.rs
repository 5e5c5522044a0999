//! Testing utilities for the confvault workspace
//!
//! Shared fixtures: documents, migrations and on-disk stores.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use confvault_document::{RawDocument, StackSchema, YamlFormat};
use confvault_manager::{ConfigLocations, ConfigManager, StoreOptions};
use confvault_migration::{FnMigration, Migration, MigrationRegistry, TransformError};
use serde_json::{json, Value};
use tempfile::TempDir;

pub fn raw(value: Value) -> RawDocument {
    RawDocument::from_value(value).unwrap()
}

/// `{version: "1.0", deployment: {log_level: "INFO"}}`
pub fn legacy_document() -> RawDocument {
    raw(json!({"version": "1.0", "deployment": {"log_level": "INFO"}}))
}

/// Expected result of migrating [`legacy_document`] to `1.2`
pub fn migrated_legacy_document() -> RawDocument {
    raw(json!({
        "version": "1.2",
        "deployment": {"logging_level": "INFO"},
        "monitoring": {"enabled": false},
        "backup": {"enabled": false}
    }))
}

pub fn legacy_yaml() -> &'static str {
    "version: '1.0'\ndeployment:\n  log_level: INFO\n"
}

/// Migration that stamps `to` and sets `field` to `true`
pub fn add_field_migration(from: &'static str, to: &'static str, field: &'static str) -> impl Migration {
    FnMigration::new(from, to, move |mut doc: RawDocument| {
        doc.set_path(field, Value::Bool(true));
        Ok(doc.with_version(to))
    })
    .with_description(format!("Set {field}"))
}

/// Migration whose body always fails
pub fn failing_migration(from: &'static str, to: &'static str) -> impl Migration {
    FnMigration::new(from, to, |_doc: RawDocument| {
        Err(TransformError::custom("simulated failure"))
    })
}

/// Migration that forgets to stamp its target version
pub fn forgetful_migration(from: &'static str, to: &'static str) -> impl Migration {
    FnMigration::new(from, to, |doc: RawDocument| Ok(doc))
}

/// Registry with a linear chain through `versions`
pub fn linear_registry(versions: &[&'static str]) -> MigrationRegistry {
    let mut registry = MigrationRegistry::new();
    for pair in versions.windows(2) {
        let to = pair[1];
        registry
            .register(FnMigration::new(pair[0], to, move |doc: RawDocument| {
                Ok(doc.with_version(to))
            }))
            .unwrap();
    }
    registry
}

/// Stack manager rooted in a temporary directory
///
/// Layout: `<root>/project` (project scope, optional) and `<root>/user`.
pub struct TestStore {
    root: TempDir,
    with_project: bool,
}

impl TestStore {
    /// User scope only
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            with_project: false,
        }
    }

    /// Project and user scopes
    pub fn with_project() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            with_project: true,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn project_dir(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn user_dir(&self) -> PathBuf {
        self.root().join("user")
    }

    pub fn locations(&self) -> ConfigLocations {
        let project = self.with_project.then(|| self.project_dir());
        ConfigLocations::new(project, self.user_dir())
    }

    pub fn project_file(&self) -> PathBuf {
        self.project_dir().join(".confvault").join("config.yaml")
    }

    pub fn user_file(&self) -> PathBuf {
        self.user_dir().join("config.yaml")
    }

    pub fn manager(&self) -> ConfigManager {
        self.manager_with(MigrationRegistry::with_defaults())
    }

    pub fn manager_with(&self, registry: MigrationRegistry) -> ConfigManager {
        ConfigManager::from_parts(
            StackSchema::new(),
            YamlFormat,
            registry,
            self.locations(),
            StoreOptions::default(),
        )
    }

    /// Write `contents` to `path`, creating parent directories
    pub fn write(&self, path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).unwrap()
    }

    /// Temporary files left in `dir`
    pub fn temp_files(&self, dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "tmp"))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}
