//! Listener registration

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::manager::Configurable;
use crate::registry::TypeRegistry;

/// What to do with a listener whose type name is not registered
///
/// The same policy applies to manager-level and connection-level listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerPolicy {
    /// Fail with `UnresolvedListenerClass`
    #[default]
    Strict,
    /// Log a warning and leave the alias unattached
    Skip,
}

/// Attach listeners grouped by category (`connection` or `record`)
pub fn apply_listeners<T: Configurable + ?Sized>(
    target: &mut T,
    listeners: &Map<String, Value>,
    types: &TypeRegistry,
    policy: ListenerPolicy,
) -> Result<()> {
    for (category, group) in listeners {
        let record = match category.to_ascii_lowercase().as_str() {
            "connection" => false,
            "record" => true,
            _ => return Err(ConfigError::invalid_listener_category(category.as_str())),
        };

        let Value::Object(group) = group else {
            return Err(ConfigError::malformed(format!(
                "Listeners '{category}' of {} must be a mapping of alias to type name",
                target.name()
            )));
        };

        for (alias, type_name) in group {
            let Value::String(type_name) = type_name else {
                return Err(ConfigError::malformed(format!(
                    "Listener '{alias}' of {} must name a type",
                    target.name()
                )));
            };

            let Some(constructor) = types.resolve_listener(type_name) else {
                match policy {
                    ListenerPolicy::Strict => {
                        return Err(ConfigError::unresolved_listener_class(type_name.as_str()));
                    }
                    ListenerPolicy::Skip => {
                        tracing::warn!(
                            target_name = target.name(),
                            alias = alias.as_str(),
                            listener = type_name.as_str(),
                            "listener type not registered, skipping"
                        );
                        continue;
                    }
                }
            };

            tracing::debug!(
                target_name = target.name(),
                alias = alias.as_str(),
                listener = type_name.as_str(),
                record,
                "attaching listener"
            );
            if record {
                target.add_record_listener(alias, constructor());
            } else {
                target.add_listener(alias, constructor());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::{ConnectionManager, MemoryManager};
    use serde_json::json;

    fn listeners(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_connection_and_record_listeners() {
        let mut manager = MemoryManager::new();
        let conn = manager.open_connection("sqlite::memory:", "main").unwrap();

        apply_listeners(
            conn,
            &listeners(json!({
                "connection": { "log": "tracing" },
                "Record": { "audit": "Doctrine_Record_Listener" }
            })),
            &TypeRegistry::with_builtins(),
            ListenerPolicy::Strict,
        )
        .unwrap();

        let conn = manager.connection("main").unwrap();
        let log = conn.listeners().get("log").unwrap();
        assert_eq!(log.class_name(), "tracing");
        assert_eq!(
            conn.record_listeners().get("audit").unwrap().class_name(),
            "Doctrine_Record_Listener"
        );
        assert!(conn.listeners().get("audit").is_none());
    }

    #[test]
    fn test_invalid_category() {
        let mut manager = MemoryManager::new();
        let err = apply_listeners(
            &mut manager,
            &listeners(json!({ "table": { "x": "noop" } })),
            &TypeRegistry::with_builtins(),
            ListenerPolicy::Skip,
        )
        .unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::InvalidListenerCategory(c) if c == "table"
        ));
    }

    #[test]
    fn test_unresolved_strict_fails() {
        let mut manager = MemoryManager::new();
        let err = apply_listeners(
            &mut manager,
            &listeners(json!({ "connection": { "profiler": "App_Profiler" } })),
            &TypeRegistry::with_builtins(),
            ListenerPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::UnresolvedListenerClass(c) if c == "App_Profiler"
        ));
    }

    #[test]
    fn test_unresolved_skip_continues() {
        let mut manager = MemoryManager::new();
        apply_listeners(
            &mut manager,
            &listeners(json!({ "connection": { "profiler": "App_Profiler", "log": "tracing" } })),
            &TypeRegistry::with_builtins(),
            ListenerPolicy::Skip,
        )
        .unwrap();

        assert!(manager.listeners().get("profiler").is_none());
        assert!(manager.listeners().get("log").is_some());
    }

    #[test]
    fn test_group_must_be_mapping() {
        let mut manager = MemoryManager::new();
        let err = apply_listeners(
            &mut manager,
            &listeners(json!({ "connection": ["tracing"] })),
            &TypeRegistry::with_builtins(),
            ListenerPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedConfig(_)));
    }
}
