use confvault_document::{
    compute_diff, deep_merge, Environment, Format, JsonFormat, LogLevel, RawDocument, Schema,
    StackConfig, StackSchema, YamlFormat,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

const PRODUCTION_YAML: &str = "\
version: '1.2'
deployment:
  environment: production
  logging_level: WARNING
  project_name: payments
services:
  redis:
    host: cache.internal
  temporal:
    namespace: payments
monitoring:
  enabled: true
  interval_seconds: 15
";

#[test]
fn yaml_file_validates_into_stack_config() {
    let raw = YamlFormat.parse(PRODUCTION_YAML).unwrap().unwrap();
    let config = StackSchema::new().validate(&raw).unwrap();

    assert_eq!(config.version, "1.2");
    assert_eq!(config.deployment.environment, Environment::Production);
    assert_eq!(config.deployment.logging_level, LogLevel::Warning);
    assert_eq!(config.services.redis.host, "cache.internal");
    assert_eq!(config.services.redis.port, 6379);
    assert_eq!(config.services.temporal.namespace, "payments");
    assert_eq!(config.monitoring.interval_seconds, 15);
    assert!(!config.backup.enabled);
}

#[test]
fn yaml_and_json_agree() {
    let schema = StackSchema::new();
    let from_yaml = schema
        .validate(&YamlFormat.parse(PRODUCTION_YAML).unwrap().unwrap())
        .unwrap();

    let json_text = JsonFormat.render(&schema.to_raw(&from_yaml).unwrap()).unwrap();
    let from_json = schema
        .validate(&JsonFormat.parse(&json_text).unwrap().unwrap())
        .unwrap();
    assert_eq!(from_json, from_yaml);
}

#[test]
fn unknown_environment_is_reported_by_path() {
    let raw = YamlFormat
        .parse("version: '1.2'\ndeployment:\n  environment: moon\n")
        .unwrap()
        .unwrap();
    let err = StackSchema::new().validate(&raw).unwrap_err();
    assert_eq!(err.issues()[0].path, "deployment.environment");
}

#[test]
fn rendered_defaults_diff_cleanly_against_themselves() {
    let schema = StackSchema::new();
    let raw = schema.to_raw(&StackConfig::default()).unwrap();
    let text = YamlFormat.render(&raw).unwrap();
    let reparsed = YamlFormat.parse(&text).unwrap().unwrap();
    assert!(compute_diff(&raw, &reparsed).is_empty());
}

proptest! {
    #[test]
    fn prop_merge_overlay_leaf_wins_and_siblings_survive(
        port in 1u16..,
        host in "[a-z]{1,12}",
    ) {
        let base = StackSchema::new().to_raw(&StackConfig::default()).unwrap();
        let overlay = RawDocument::from_value(json!({"services": {"redis": {"port": port}}})).unwrap();

        let merged = deep_merge(&base, &overlay);
        let expected_port = json!(port);
        let default_host = json!("localhost");
        prop_assert_eq!(merged.get_path("services.redis.port"), Some(&expected_port));
        prop_assert_eq!(merged.get_path("services.redis.host"), Some(&default_host));
        prop_assert_eq!(merged.get("monitoring"), base.get("monitoring"));

        let host_overlay =
            RawDocument::from_value(json!({"services": {"redis": {"host": host.clone()}}})).unwrap();
        let with_host = deep_merge(&merged, &host_overlay);
        let config = StackSchema::new().validate(&with_host).unwrap();
        prop_assert_eq!(config.services.redis.port, port);
        prop_assert_eq!(config.services.redis.host, host);
    }
}
