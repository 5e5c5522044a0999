//! Migration registry
//!
//! [`MigrationRegistry`] holds migrations as edges of a directed version
//! graph, finds the shortest chain between two versions and executes it
//! all-or-nothing.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

use confvault_document::{compute_diff, DocumentDiff, RawDocument, Version};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::builtin;
use crate::error::{MigrationError, PathError, RegistryError, StepFailure};
use crate::history::MigrationHistory;
use crate::migration::{validate_after, validate_before, Migration, MigrationId};

struct Edge {
    to: Version,
    migration: Arc<dyn Migration>,
}

/// Registry of schema migrations
///
/// Nodes are parsed versions, so `"1.2"` and `"1.2.0"` are the same node.
/// Cycles are allowed; path discovery always terminates.
#[derive(Default)]
pub struct MigrationRegistry {
    edges: IndexMap<Version, Vec<Edge>>,
    history: Vec<MigrationHistory>,
}

impl MigrationRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with the built-in stack migrations
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for migration in builtin::defaults() {
            if let Err(e) = registry.register_shared(migration) {
                warn!(error = %e, "skipping built-in migration");
            }
        }
        registry
    }

    /// Register a migration
    ///
    /// # Errors
    /// Returns error if a version is empty or malformed, both versions are
    /// equal, or the same edge is already registered
    pub fn register(&mut self, migration: impl Migration + 'static) -> Result<(), RegistryError> {
        self.register_shared(Arc::new(migration))
    }

    /// Register a shared migration
    ///
    /// # Errors
    /// Same as [`register`](Self::register)
    pub fn register_shared(&mut self, migration: Arc<dyn Migration>) -> Result<(), RegistryError> {
        let from = parse_endpoint("from", migration.from_version())?;
        let to = parse_endpoint("to", migration.to_version())?;

        if from == to {
            return Err(RegistryError::SelfLoop {
                version: migration.from_version().to_string(),
            });
        }

        let edges = self.edges.entry(from).or_default();
        if edges.iter().any(|edge| edge.to == to) {
            return Err(RegistryError::Duplicate {
                from: migration.from_version().to_string(),
                to: migration.to_version().to_string(),
            });
        }

        debug!(migration = %migration.id(), "registered migration");
        edges.push(Edge { to, migration });
        Ok(())
    }

    /// Check if an edge `from -> to` is registered
    #[must_use]
    pub fn contains(&self, from: &str, to: &str) -> bool {
        let (Ok(from), Ok(to)) = (Version::parse(from), Version::parse(to)) else {
            return false;
        };
        self.edges
            .get(&from)
            .is_some_and(|edges| edges.iter().any(|edge| edge.to == to))
    }

    /// Iterate over registered migrations in registration order per source version
    pub fn migrations(&self) -> impl Iterator<Item = &dyn Migration> {
        self.edges
            .values()
            .flatten()
            .map(|edge| edge.migration.as_ref())
    }

    /// Number of registered migrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Check if no migrations are registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the shortest chain of migrations from `from` to `to`
    ///
    /// Returns an empty chain when both versions are equal. Among chains of
    /// equal length the one discovered first (registration order) wins.
    ///
    /// # Errors
    /// Returns error if a version is malformed, `from > to`, or the
    /// versions are not connected
    pub fn get_migration_path(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Vec<Arc<dyn Migration>>, PathError> {
        let start = parse_path_endpoint(from)?;
        let target = parse_path_endpoint(to)?;

        match start.cmp(&target) {
            Ordering::Equal => return Ok(Vec::new()),
            Ordering::Greater => {
                return Err(PathError::Downgrade {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            Ordering::Less => {}
        }

        let mut visited = HashSet::from([start]);
        let mut came_from: HashMap<Version, (Version, &Arc<dyn Migration>)> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for edge in self.edges.get(&current).into_iter().flatten() {
                if !visited.insert(edge.to) {
                    continue;
                }
                came_from.insert(edge.to, (current, &edge.migration));
                if edge.to == target {
                    let path = unwind(&came_from, start, target);
                    debug!(from, to, steps = path.len(), "resolved migration path");
                    return Ok(path);
                }
                queue.push_back(edge.to);
            }
        }

        Err(PathError::NoPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Migrate `document` to `target_version`
    ///
    /// Steps run over a private copy; `document` itself is never modified.
    /// Unless `dry_run`, one history entry is recorded per attempted step.
    ///
    /// # Errors
    /// Returns error if the document has no version, no chain exists, or any
    /// step fails (no partially migrated document is returned)
    pub fn migrate(
        &mut self,
        document: &RawDocument,
        target_version: &str,
        dry_run: bool,
    ) -> Result<RawDocument, MigrationError> {
        let (current, path) = self.resolve(document, target_version)?;
        if path.is_empty() {
            return Ok(document.clone());
        }

        info!(from = %current, to = target_version, steps = path.len(), dry_run, "migrating document");
        let sink = if dry_run { None } else { Some(&mut self.history) };
        let report = run_chain(&path, document, &current, target_version, sink)?;
        Ok(report.document)
    }

    /// Run the chain without recording history and report every step
    ///
    /// # Errors
    /// Same as [`migrate`](Self::migrate)
    pub fn dry_run(
        &self,
        document: &RawDocument,
        target_version: &str,
    ) -> Result<ChainReport, MigrationError> {
        let (current, path) = self.resolve(document, target_version)?;
        run_chain(&path, document, &current, target_version, None)
    }

    /// Render the changes a migration to `target_version` would make
    ///
    /// # Errors
    /// Same as [`migrate`](Self::migrate)
    pub fn preview_migration(
        &self,
        document: &RawDocument,
        target_version: &str,
    ) -> Result<String, MigrationError> {
        Ok(self.dry_run(document, target_version)?.to_string())
    }

    /// Check if `document` is older than `target_version`
    ///
    /// A document without a version always needs migration. Unparsable
    /// versions are logged and reported as not needing migration; schema
    /// validation rejects them afterwards.
    #[must_use]
    pub fn needs_migration(&self, document: &RawDocument, target_version: &str) -> bool {
        let Some(current) = document.version() else {
            return true;
        };
        match Version::compare(&current, target_version) {
            Ok(ordering) => ordering == Ordering::Less,
            Err(e) => {
                warn!(
                    current = %current,
                    target = target_version,
                    error = %e,
                    "cannot compare versions, assuming no migration needed"
                );
                false
            }
        }
    }

    /// Recorded history, oldest first
    #[inline]
    #[must_use]
    pub fn get_history(&self) -> &[MigrationHistory] {
        &self.history
    }

    /// Drop all recorded history
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn resolve(
        &self,
        document: &RawDocument,
        target_version: &str,
    ) -> Result<(String, Vec<Arc<dyn Migration>>), MigrationError> {
        let current = document.version().ok_or(MigrationError::MissingVersion)?;
        let path = self.get_migration_path(&current, target_version)?;
        Ok((current, path))
    }
}

impl Debug for MigrationRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.migrations().map(|m| m.id().to_string()).collect();
        f.debug_struct("MigrationRegistry")
            .field("migrations", &ids)
            .field("history", &self.history.len())
            .finish()
    }
}

/// Outcome of a dry-run chain
#[derive(Debug, Clone, PartialEq)]
pub struct ChainReport {
    /// Starting version
    pub from: String,
    /// Requested version
    pub to: String,
    /// Final migrated document
    pub document: RawDocument,
    /// Executed steps in order
    pub steps: Vec<StepReport>,
}

impl ChainReport {
    /// Check if the chain was empty
    #[inline]
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Display for ChainReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            return writeln!(f, "No migration needed (already at {})", self.from);
        }
        writeln!(
            f,
            "Migration {} -> {} ({} step{})",
            self.from,
            self.to,
            self.steps.len(),
            if self.steps.len() == 1 { "" } else { "s" }
        )?;
        for (index, step) in self.steps.iter().enumerate() {
            if step.description.is_empty() {
                writeln!(f, "[{}] {}", index + 1, step.migration)?;
            } else {
                writeln!(f, "[{}] {}: {}", index + 1, step.migration, step.description)?;
            }
            write!(f, "{}", step.changes)?;
        }
        Ok(())
    }
}

/// One executed step of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Migration applied
    pub migration: MigrationId,
    /// Migration description
    pub description: String,
    /// Changes made by this step
    pub changes: DocumentDiff,
}

fn parse_endpoint(side: &'static str, version: &str) -> Result<Version, RegistryError> {
    if version.trim().is_empty() {
        return Err(RegistryError::MissingVersion { side });
    }
    Version::parse(version).map_err(|source| RegistryError::MalformedVersion {
        version: version.to_string(),
        source,
    })
}

fn parse_path_endpoint(version: &str) -> Result<Version, PathError> {
    Version::parse(version).map_err(|source| PathError::InvalidVersion {
        version: version.to_string(),
        source,
    })
}

fn unwind(
    came_from: &HashMap<Version, (Version, &Arc<dyn Migration>)>,
    start: Version,
    target: Version,
) -> Vec<Arc<dyn Migration>> {
    let mut path = Vec::new();
    let mut cursor = target;
    while cursor != start {
        let Some((previous, migration)) = came_from.get(&cursor) else {
            break;
        };
        path.push(Arc::clone(migration));
        cursor = *previous;
    }
    path.reverse();
    path
}

fn run_chain(
    path: &[Arc<dyn Migration>],
    document: &RawDocument,
    from: &str,
    to: &str,
    mut history: Option<&mut Vec<MigrationHistory>>,
) -> Result<ChainReport, MigrationError> {
    let total = path.len();
    let mut working = document.clone();
    let mut steps = Vec::with_capacity(total);

    for (index, migration) in path.iter().enumerate() {
        let id = migration.id();
        debug!(step = index + 1, total, migration = %id, "applying migration");

        match apply_step(migration.as_ref(), &id, &working) {
            Ok(next) => {
                let changes = compute_diff(&working, &next);
                if let Some(history) = history.as_deref_mut() {
                    history.push(MigrationHistory::succeeded(&id, changes.clone()));
                }
                steps.push(StepReport {
                    migration: id,
                    description: migration.description().to_string(),
                    changes,
                });
                working = next;
            }
            Err(cause) => {
                warn!(step = index + 1, total, migration = %id, error = %cause, "migration step failed");
                if let Some(history) = history.as_deref_mut() {
                    history.push(MigrationHistory::failed(&id, &cause));
                }
                return Err(MigrationError::StepFailed {
                    step: index + 1,
                    total,
                    from: id.from,
                    to: id.to,
                    cause,
                });
            }
        }
    }

    Ok(ChainReport {
        from: from.to_string(),
        to: to.to_string(),
        document: working,
        steps,
    })
}

fn apply_step(
    migration: &dyn Migration,
    id: &MigrationId,
    document: &RawDocument,
) -> Result<RawDocument, StepFailure> {
    validate_before(id, document)?;
    let migrated = migration.migrate(document.clone())?;
    validate_after(id, &migrated)?;
    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::migration::FnMigration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn stamp(from: &'static str, to: &'static str) -> impl Migration {
        FnMigration::new(from, to, move |doc: RawDocument| Ok(doc.with_version(to)))
    }

    fn ids(path: &[Arc<dyn Migration>]) -> Vec<String> {
        path.iter().map(|m| m.id().to_string()).collect()
    }

    #[test]
    fn register_rejects_bad_edges() {
        let mut registry = MigrationRegistry::new();
        assert!(matches!(
            registry.register(stamp("", "1.0")),
            Err(RegistryError::MissingVersion { side: "from" })
        ));
        assert!(matches!(
            registry.register(stamp("1.0", " ")),
            Err(RegistryError::MissingVersion { side: "to" })
        ));
        assert!(matches!(
            registry.register(stamp("1.x", "1.1")),
            Err(RegistryError::MalformedVersion { .. })
        ));
        assert!(matches!(
            registry.register(stamp("1.0", "1.0.0")),
            Err(RegistryError::SelfLoop { .. })
        ));

        registry.register(stamp("1.0", "1.1")).unwrap();
        assert!(matches!(
            registry.register(stamp("1.0.0", "1.1")),
            Err(RegistryError::Duplicate { .. })
        ));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("1.0", "1.1.0"));
        assert!(!registry.contains("1.1", "1.0"));
    }

    #[test]
    fn path_prefers_fewest_steps() {
        let mut registry = MigrationRegistry::new();
        registry.register(stamp("1.0", "1.1")).unwrap();
        registry.register(stamp("1.1", "1.2")).unwrap();
        registry.register(stamp("1.2", "2.0")).unwrap();
        registry.register(stamp("1.1", "2.0")).unwrap();

        let path = registry.get_migration_path("1.0", "2.0").unwrap();
        assert_eq!(ids(&path), vec!["1.0 -> 1.1", "1.1 -> 2.0"]);
    }

    #[test]
    fn path_ties_follow_registration_order() {
        let mut registry = MigrationRegistry::new();
        registry.register(stamp("1.0", "1.1")).unwrap();
        registry.register(stamp("1.0", "1.5")).unwrap();
        registry.register(stamp("1.5", "2.0")).unwrap();
        registry.register(stamp("1.1", "2.0")).unwrap();

        let path = registry.get_migration_path("1.0", "2.0").unwrap();
        assert_eq!(ids(&path), vec!["1.0 -> 1.1", "1.1 -> 2.0"]);
    }

    #[test]
    fn path_terminates_on_cycles() {
        let mut registry = MigrationRegistry::new();
        registry.register(stamp("1.0", "1.1")).unwrap();
        registry.register(stamp("1.1", "1.0")).unwrap();
        assert!(matches!(
            registry.get_migration_path("1.0", "3.0"),
            Err(PathError::NoPath { .. })
        ));
    }

    #[test]
    fn equal_and_downgrade_paths() {
        let registry = MigrationRegistry::with_defaults();
        assert!(registry.get_migration_path("1.2", "1.2.0").unwrap().is_empty());
        assert!(matches!(
            registry.get_migration_path("1.2", "1.0"),
            Err(PathError::Downgrade { .. })
        ));
        assert!(matches!(
            registry.get_migration_path("one", "1.0"),
            Err(PathError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn failing_step_aborts_chain_and_records_history() {
        let mut registry = MigrationRegistry::new();
        registry.register(stamp("1.0", "1.1")).unwrap();
        registry
            .register(FnMigration::new("1.1", "1.2", |_doc: RawDocument| {
                Err(TransformError::custom("boom"))
            }))
            .unwrap();

        let doc = RawDocument::from_value(json!({"version": "1.0", "keep": 1})).unwrap();
        let err = registry.migrate(&doc, "1.2", false).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::StepFailed { step: 2, total: 2, .. }
        ));

        let history = registry.get_history();
        assert_eq!(history.len(), 2);
        assert!(history[0].success);
        assert!(!history[1].success);
        assert_eq!(history[1].error.as_deref(), Some("boom"));
        assert_eq!(doc.version().as_deref(), Some("1.0"));
    }

    #[test]
    fn forgetting_to_stamp_version_fails_after_guard() {
        let mut registry = MigrationRegistry::new();
        registry
            .register(FnMigration::new("1.0", "1.1", |doc: RawDocument| Ok(doc)))
            .unwrap();
        let doc = RawDocument::new().with_version("1.0");
        let err = registry.migrate(&doc, "1.1", false).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn missing_version_is_rejected() {
        let mut registry = MigrationRegistry::with_defaults();
        assert_eq!(
            registry.migrate(&RawDocument::new(), "1.2", false),
            Err(MigrationError::MissingVersion)
        );
    }

    #[test]
    fn needs_migration_cases() {
        let registry = MigrationRegistry::new();
        assert!(registry.needs_migration(&RawDocument::new(), "1.2"));
        assert!(registry.needs_migration(&RawDocument::new().with_version("1.0"), "1.2"));
        assert!(!registry.needs_migration(&RawDocument::new().with_version("1.2.0"), "1.2"));
        assert!(!registry.needs_migration(&RawDocument::new().with_version("2.0"), "1.2"));
        assert!(!registry.needs_migration(&RawDocument::new().with_version("latest"), "1.2"));
    }

    #[test]
    fn preview_lists_steps_and_changes() {
        let registry = MigrationRegistry::with_defaults();
        let doc = RawDocument::from_value(json!({
            "version": "1.0",
            "deployment": {"log_level": "INFO"}
        }))
        .unwrap();

        let preview = registry.preview_migration(&doc, "1.2").unwrap();
        assert!(preview.starts_with("Migration 1.0 -> 1.2 (2 steps)\n"));
        assert!(preview.contains("  + monitoring\n"));
        assert!(preview.contains("  + backup\n"));
        assert!(preview.contains("  ~ deployment\n"));
        assert!(!preview.contains("  - "));

        let noop = registry.preview_migration(&doc.clone().with_version("1.2"), "1.2").unwrap();
        assert_eq!(noop, "No migration needed (already at 1.2)\n");
    }

    #[test]
    fn debug_lists_migrations() {
        let registry = MigrationRegistry::with_defaults();
        let debug = format!("{registry:?}");
        assert!(debug.contains("1.0 -> 1.1"));
        assert!(debug.contains("1.1 -> 1.2"));
    }
}
