//! Type Registry
//!
//! Cache backends and listeners are named in configuration by type name.
//! Instead of looking those names up in a live symbol table, modules that
//! provide implementations register a constructor under a logical name at
//! startup, and the configurator resolves names through this registry.
//!
//! # Name Matching
//! Names are matched case-insensitively (`Doctrine_Cache_Array` and
//! `doctrine_cache_array` resolve to the same constructor).
//!
//! # Built-ins
//! [`TypeRegistry::with_builtins`] registers:
//! - caches: `array` / `Doctrine_Cache_Array` ([`ArrayCache`])
//! - listeners: `noop` / `Doctrine_EventListener` / `Doctrine_Record_Listener`
//!   ([`NoopListener`]) and `tracing` ([`TracingListener`])

pub mod cache;
pub mod listener;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use cache::{ArrayCache, Cache};
pub use listener::{Listener, NoopListener, TracingListener};

/// Builds a cache from a descriptor's options mapping
///
/// Errors are plain messages; the caller attributes them to the attribute
/// being configured.
pub type CacheConstructor =
    Arc<dyn Fn(&Map<String, Value>) -> std::result::Result<Arc<dyn Cache>, String> + Send + Sync>;

/// Builds a listener with no arguments
pub type ListenerConstructor = Arc<dyn Fn() -> Box<dyn Listener> + Send + Sync>;

/// Name to constructor mapping for caches and listeners
#[derive(Clone, Default)]
pub struct TypeRegistry {
    caches: HashMap<String, CacheConstructor>,
    listeners: HashMap<String, ListenerConstructor>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in caches and listeners
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        for name in ["array", "Doctrine_Cache_Array"] {
            registry.register_cache(name, move |options| {
                let cache = ArrayCache::from_options(name, options)?;
                Ok(Arc::new(cache) as Arc<dyn Cache>)
            });
        }

        for name in ["noop", "Doctrine_EventListener", "Doctrine_Record_Listener"] {
            registry.register_listener(name, move || Box::new(NoopListener::new(name)));
        }
        registry.register_listener("tracing", || Box::new(TracingListener::new("tracing")));

        registry
    }

    /// Register a cache constructor, replacing any previous one under `name`
    pub fn register_cache<F>(&mut self, name: impl AsRef<str>, constructor: F) -> &mut Self
    where
        F: Fn(&Map<String, Value>) -> std::result::Result<Arc<dyn Cache>, String>
            + Send
            + Sync
            + 'static,
    {
        self.caches
            .insert(normalize(name.as_ref()), Arc::new(constructor));
        self
    }

    /// Register a listener constructor, replacing any previous one under `name`
    pub fn register_listener<F>(&mut self, name: impl AsRef<str>, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Listener> + Send + Sync + 'static,
    {
        self.listeners
            .insert(normalize(name.as_ref()), Arc::new(constructor));
        self
    }

    /// Look up a cache constructor by type name
    #[must_use]
    pub fn resolve_cache(&self, name: &str) -> Option<&CacheConstructor> {
        self.caches.get(&normalize(name))
    }

    /// Look up a listener constructor by type name
    #[must_use]
    pub fn resolve_listener(&self, name: &str) -> Option<&ListenerConstructor> {
        self.listeners.get(&normalize(name))
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut caches: Vec<_> = self.caches.keys().collect();
        let mut listeners: Vec<_> = self.listeners.keys().collect();
        caches.sort();
        listeners.sort();
        f.debug_struct("TypeRegistry")
            .field("caches", &caches)
            .field("listeners", &listeners)
            .finish()
    }
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry_resolves_nothing() {
        let registry = TypeRegistry::new();
        assert!(registry.resolve_cache("array").is_none());
        assert!(registry.resolve_listener("noop").is_none());
    }

    #[test]
    fn test_builtins_resolve_case_insensitively() {
        let registry = TypeRegistry::with_builtins();
        for name in ["array", "DOCTRINE_CACHE_ARRAY"] {
            assert!(registry.resolve_cache(name).is_some(), "{name}");
        }
        for name in ["doctrine_eventlistener", "Doctrine_Record_Listener", "tracing"] {
            assert!(registry.resolve_listener(name).is_some(), "{name}");
        }
        assert!(registry.resolve_cache("Doctrine_Cache_Apc").is_none());
    }

    #[test]
    fn test_builtin_cache_keeps_registered_name() {
        let registry = TypeRegistry::with_builtins();
        let constructor = registry.resolve_cache("Doctrine_Cache_Array").unwrap();
        let cache = constructor(&Map::new()).unwrap();
        assert_eq!(cache.class_name(), "Doctrine_Cache_Array");
    }

    #[test]
    fn test_custom_listener_registration() {
        #[derive(Debug)]
        struct AuditListener;
        impl Listener for AuditListener {
            fn class_name(&self) -> &str {
                "App_Listener_Audit"
            }
        }

        let mut registry = TypeRegistry::new();
        registry.register_listener("App_Listener_Audit", || Box::new(AuditListener));

        let listener = registry.resolve_listener("app_listener_audit").unwrap()();
        assert_eq!(listener.class_name(), "App_Listener_Audit");
    }

    #[test]
    fn test_debug_lists_names() {
        let registry = TypeRegistry::with_builtins();
        let debug = format!("{registry:?}");
        assert!(debug.contains("doctrine_cache_array"));
        assert!(debug.contains("tracing"));
    }
}
