//! Cache backends assignable to the query and result cache slots

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A cache instance built from a cache descriptor
///
/// Implementations are constructed once per configured attribute and then
/// owned by the connection or manager they were assigned to.
pub trait Cache: Send + Sync + fmt::Debug {
    /// Name the cache was registered under
    fn class_name(&self) -> &str;

    /// Options the cache was constructed with
    fn options(&self) -> &Map<String, Value>;

    /// Fetch a cached entry
    fn fetch(&self, id: &str) -> Option<Value>;

    /// Store an entry, replacing any previous value
    fn save(&self, id: &str, data: Value);

    /// Check whether an entry exists
    fn contains(&self, id: &str) -> bool;

    /// Remove an entry, returning whether it existed
    fn delete(&self, id: &str) -> bool;
}

/// In-process cache backed by a hash map
///
/// # Options
/// - `prefix` (string): prepended to every key
#[derive(Debug)]
pub struct ArrayCache {
    class_name: String,
    options: Map<String, Value>,
    prefix: String,
    entries: Mutex<HashMap<String, Value>>,
}

impl ArrayCache {
    /// Build an `ArrayCache` from a descriptor's options mapping
    pub fn from_options(
        class_name: impl Into<String>,
        options: &Map<String, Value>,
    ) -> std::result::Result<Self, String> {
        let prefix = match options.get("prefix") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(p)) => p.clone(),
            Some(other) => return Err(format!("prefix must be a string, got {other}")),
        };

        Ok(Self {
            class_name: class_name.into(),
            options: options.clone(),
            prefix,
            entries: Mutex::new(HashMap::new()),
        })
    }

    fn key(&self, id: &str) -> String {
        format!("{}{id}", self.prefix)
    }
}

impl Cache for ArrayCache {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    fn fetch(&self, id: &str) -> Option<Value> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&self.key(id)).cloned()
    }

    fn save(&self, id: &str, data: Value) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(self.key(id), data);
    }

    fn contains(&self, id: &str) -> bool {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(&self.key(id))
    }

    fn delete(&self, id: &str) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&self.key(id)).is_some()
    }
}
