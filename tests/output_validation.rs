//! Output Validation Tests
//!
//! Validates the JSON shape of CLI output:
//! - Success envelopes carry exactly `ok`, `command`, `data`, `meta`
//! - Error envelopes carry exactly `ok`, `command`, `error`
//! - A resource summary serializes paths and connection names only
//! - Error messages never leak DSN passwords

use ormconf::{
    ConfigError, ConfigTree, Configurator, ErrorEnvelope, MemoryManager, Metadata,
    SuccessEnvelope, TypeRegistry,
};
use serde_json::json;

fn top_level_keys(value: &serde_json::Value) -> Vec<&str> {
    value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect()
}

#[test]
fn test_success_envelope_structure() {
    let value = json!({ "connections": { "main": { "dsn": "sqlite::memory:" } } });
    let tree = ConfigTree::from_value(value).unwrap();
    let summary = Configurator::new()
        .with_type_registry(TypeRegistry::with_builtins())
        .configure(&mut MemoryManager::new(), &tree)
        .unwrap();

    let meta = Metadata::with_source(3, "config.json");
    let envelope = SuccessEnvelope::new("check", summary, meta);
    let value = serde_json::to_value(&envelope).expect("Should serialize");

    assert_eq!(
        top_level_keys(&value),
        vec!["ok", "command", "data", "meta"]
    );
    assert_eq!(value["ok"], true);
    assert_eq!(value["command"], "check");
    assert_eq!(value["data"], json!({ "connections": ["main"] }));
    assert_eq!(value["meta"]["execution_ms"], 3);
    assert_eq!(value["meta"]["source"], "config.json");
}

#[test]
fn test_summary_with_paths() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("models")).unwrap();

    let tree = ConfigTree::from_value(json!({
        "paths": { "models": { "root": "models" } },
        "connections": {}
    }))
    .unwrap();
    let summary = Configurator::new()
        .with_base_dir(dir.path())
        .configure(&mut MemoryManager::new(), &tree)
        .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    let expected = dir.path().join("models").canonicalize().unwrap();
    assert_eq!(value["paths"]["models"]["root"], json!(expected));
    assert_eq!(value["connections"], json!([]));
}

#[test]
fn test_error_envelope_structure() {
    let err = ConfigError::path_not_found("./nonexistent");
    let value = serde_json::to_value(ErrorEnvelope::from_error("check", &err)).unwrap();

    assert_eq!(top_level_keys(&value), vec!["ok", "command", "error"]);
    assert_eq!(value["ok"], false);
    assert_eq!(value["error"]["code"], "PATH_NOT_FOUND");
    assert_eq!(value["error"]["message"], "./nonexistent does not exist");
}

#[test]
fn test_open_failure_does_not_leak_password() {
    let tree = ConfigTree::from_value(json!({ "connections": { "main": { "dsn": {
        "adapter": "", "user": "app", "pass": "hunter2", "hostspec": "h", "database": "d"
    } } } }))
    .unwrap();

    let mut manager = MemoryManager::new();
    let err = Configurator::new()
        .configure(&mut manager, &tree)
        .unwrap_err();
    let value = serde_json::to_value(ErrorEnvelope::from_error("check", &err)).unwrap();

    assert_eq!(value["error"]["code"], "CONNECTION_OPEN_FAILED");
    assert!(!value.to_string().contains("hunter2"));
}
