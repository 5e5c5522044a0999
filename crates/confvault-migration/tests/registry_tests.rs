use std::sync::Arc;

use confvault_document::RawDocument;
use confvault_migration::{
    validate_before, AddBackupAndRenameLogLevel, AddMonitoringSection, FnMigration, GuardError,
    Migration, MigrationError, MigrationRegistry, PathError, StepFailure,
};
use confvault_test_utils::{
    add_field_migration, failing_migration, forgetful_migration, legacy_document, linear_registry,
    migrated_legacy_document, raw,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

#[test]
fn legacy_document_migrates_through_both_builtins() {
    let mut registry = MigrationRegistry::with_defaults();
    let input = legacy_document();

    let path = registry.get_migration_path("1.0", "1.2").unwrap();
    let ids: Vec<String> = path.iter().map(|m| m.id().to_string()).collect();
    assert_eq!(ids, vec!["1.0 -> 1.1", "1.1 -> 1.2"]);

    let migrated = registry.migrate(&input, "1.2", false).unwrap();
    assert_eq!(migrated, migrated_legacy_document());
    assert!(migrated.get_path("deployment.log_level").is_none());

    let history = registry.get_history();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|entry| entry.success));
    assert_eq!(history[0].changes.added, vec!["monitoring"]);
    assert_eq!(history[0].changes.modified, vec!["version"]);
    assert_eq!(history[1].changes.added, vec!["backup"]);
    assert_eq!(history[1].changes.modified, vec!["version", "deployment"]);
    assert!(history[1].changes.removed.is_empty());
    assert_eq!(history[1].to_version, "1.2");
}

#[test]
fn dry_run_leaves_history_and_input_untouched() {
    let mut registry = MigrationRegistry::with_defaults();
    let input = legacy_document();
    let snapshot = serde_json::to_vec(&input).unwrap();

    let migrated = registry.migrate(&input, "1.2", true).unwrap();
    assert_eq!(migrated.version().as_deref(), Some("1.2"));
    assert!(registry.get_history().is_empty());
    assert_eq!(serde_json::to_vec(&input).unwrap(), snapshot);

    let report = registry.dry_run(&input, "1.2").unwrap();
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.document, migrated);
    assert!(registry.get_history().is_empty());
}

#[test]
fn real_run_never_mutates_input() {
    let mut registry = MigrationRegistry::with_defaults();
    let input = legacy_document();
    let before = input.clone();
    registry.migrate(&input, "1.2", false).unwrap();
    assert_eq!(input, before);
}

#[test]
fn builtins_only_accept_their_source_version() {
    let migrations: Vec<Arc<dyn Migration>> = vec![
        Arc::new(AddMonitoringSection),
        Arc::new(AddBackupAndRenameLogLevel),
    ];
    for migration in migrations {
        let id = migration.id();
        let mut registry = MigrationRegistry::new();
        registry.register_shared(Arc::clone(&migration)).unwrap();

        let migrated = registry
            .migrate(&raw(json!({"version": id.from.clone()})), &id.to, false)
            .unwrap();
        assert_eq!(migrated.version(), Some(id.to.clone()));

        for other in ["0.9", "1.5", "2.0"] {
            let err = validate_before(&id, &raw(json!({"version": other}))).unwrap_err();
            assert!(matches!(err, GuardError::VersionMismatch { .. }));
        }
    }
}

#[test]
fn intermediate_fields_survive_the_chain() {
    let mut registry = MigrationRegistry::new();
    registry.register(add_field_migration("1.0", "1.1", "features.a")).unwrap();
    registry.register(add_field_migration("1.1", "1.2", "features.b")).unwrap();

    let migrated = registry
        .migrate(&raw(json!({"version": "1.0", "name": "svc"})), "1.2", false)
        .unwrap();
    assert_eq!(
        migrated.into_value(),
        json!({"version": "1.2", "name": "svc", "features": {"a": true, "b": true}})
    );
}

#[test]
fn failure_mid_chain_returns_no_partial_result() {
    let mut registry = MigrationRegistry::new();
    registry.register(add_field_migration("1.0", "1.1", "a")).unwrap();
    registry.register(failing_migration("1.1", "1.2")).unwrap();
    registry.register(add_field_migration("1.2", "1.3", "c")).unwrap();

    let input = raw(json!({"version": "1.0"}));
    let err = registry.migrate(&input, "1.3", false).unwrap_err();
    match err {
        MigrationError::StepFailed {
            step,
            total,
            ref from,
            ref to,
            cause: StepFailure::Transform(_),
        } => {
            assert_eq!((step, total), (2, 3));
            assert_eq!((from.as_str(), to.as_str()), ("1.1", "1.2"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let outcomes: Vec<bool> = registry.get_history().iter().map(|h| h.success).collect();
    assert_eq!(outcomes, vec![true, false]);
    assert_eq!(input, raw(json!({"version": "1.0"})));
}

#[test]
fn failure_during_dry_run_records_nothing() {
    let mut registry = MigrationRegistry::new();
    registry.register(failing_migration("1.0", "1.1")).unwrap();
    assert!(registry.migrate(&raw(json!({"version": "1.0"})), "1.1", true).is_err());
    assert!(registry.get_history().is_empty());
}

#[test]
fn forgetful_migration_is_caught_by_after_guard() {
    let mut registry = MigrationRegistry::new();
    registry.register(forgetful_migration("1.0", "1.1")).unwrap();
    let err = registry
        .migrate(&raw(json!({"version": "1.0"})), "1.1", false)
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.guard_error().is_some());
}

#[test]
fn document_already_at_target_is_returned_unchanged() {
    let mut registry = MigrationRegistry::with_defaults();
    let doc = raw(json!({"version": "1.2.0", "extra": [1, 2]}));
    assert_eq!(registry.migrate(&doc, "1.2", false).unwrap(), doc);
    assert!(registry.get_history().is_empty());
}

#[test]
fn clear_history_empties_log() {
    let mut registry = linear_registry(&["1.0", "1.1", "1.2"]);
    registry.migrate(&raw(json!({"version": "1.0"})), "1.2", false).unwrap();
    assert_eq!(registry.get_history().len(), 2);
    registry.clear_history();
    assert!(registry.get_history().is_empty());
}

#[test]
fn unreachable_target_is_a_path_error() {
    let mut registry = linear_registry(&["1.0", "1.1"]);
    let err = registry
        .migrate(&raw(json!({"version": "1.0"})), "2.0", false)
        .unwrap_err();
    assert!(matches!(err, MigrationError::Path(PathError::NoPath { .. })));
}

fn version(index: usize) -> String {
    format!("1.{index}")
}

/// All-pairs shortest hop counts for `n` nodes
fn hop_counts(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<Option<usize>>> {
    let mut dist = vec![vec![None; n]; n];
    for (i, row) in dist.iter_mut().enumerate() {
        row[i] = Some(0);
    }
    for &(a, b) in edges {
        if a != b {
            dist[a][b] = Some(1);
        }
    }
    for k in 0..n {
        for i in 0..n {
            for j in 0..n {
                if let (Some(ik), Some(kj)) = (dist[i][k], dist[k][j]) {
                    if dist[i][j].map_or(true, |ij| ik + kj < ij) {
                        dist[i][j] = Some(ik + kj);
                    }
                }
            }
        }
    }
    dist
}

proptest! {
    #[test]
    fn prop_same_version_has_empty_path(major in 0u64..50, minor in 0u64..50) {
        let registry = MigrationRegistry::with_defaults();
        let short = format!("{major}.{minor}");
        let long = format!("{major}.{minor}.0");
        prop_assert!(registry.get_migration_path(&short, &long).unwrap().is_empty());
    }

    #[test]
    fn prop_downgrade_is_always_rejected(a in (0u64..20, 0u64..20), b in (0u64..20, 0u64..20)) {
        prop_assume!(a > b);
        let registry = MigrationRegistry::with_defaults();
        let result = registry.get_migration_path(&format!("{}.{}", a.0, a.1), &format!("{}.{}", b.0, b.1));
        let is_downgrade = matches!(result, Err(PathError::Downgrade { .. }));
        prop_assert!(is_downgrade);
    }

    #[test]
    fn prop_path_is_shortest_and_connected(
        edges in proptest::collection::vec((0usize..8, 0usize..8), 0..24),
        from in 0usize..8,
        to in 0usize..8,
    ) {
        prop_assume!(from < to);
        let mut registry = MigrationRegistry::new();
        for &(a, b) in &edges {
            if a != b {
                let _ = registry.register(add_field_migration_owned(a, b));
            }
        }

        let dist = hop_counts(8, &edges);
        match (registry.get_migration_path(&version(from), &version(to)), dist[from][to]) {
            (Ok(path), Some(hops)) => {
                prop_assert_eq!(path.len(), hops);
                prop_assert_eq!(path[0].from_version(), version(from));
                prop_assert_eq!(path[path.len() - 1].to_version(), version(to));
                for pair in path.windows(2) {
                    prop_assert_eq!(pair[0].to_version(), pair[1].from_version());
                }
            }
            (Err(PathError::NoPath { .. }), None) => {}
            (other, expected) => {
                prop_assert!(false, "got {:?}, expected {:?} hops", other.map(|p| p.len()), expected);
            }
        }
    }
}

fn add_field_migration_owned(from: usize, to: usize) -> impl Migration {
    let target = version(to);
    FnMigration::new(version(from), target.clone(), move |doc: RawDocument| {
        Ok(doc.with_version(target.clone()))
    })
}
