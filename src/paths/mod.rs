//! Path Registration
//!
//! Registers named filesystem locations (model directories, fixtures,
//! migrations, ...) after checking that each one is an existing directory.
//! Categories and keys keep their configuration order.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

type PathGroup = Vec<(String, PathBuf)>;

/// `category -> subkey -> canonical directory`
///
/// Serializes as a nested JSON object in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRegistry {
    groups: Vec<(String, PathGroup)>,
}

impl PathRegistry {
    /// Look up a registered path
    #[must_use]
    pub fn get(&self, category: &str, key: &str) -> Option<&Path> {
        self.group(category)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, path)| path.as_path())
    }

    /// Registered categories, in configuration order
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(category, _)| category.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group(&self, category: &str) -> Option<&PathGroup> {
        self.groups
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, group)| group)
    }

    fn insert(&mut self, category: &str, key: &str, path: PathBuf) {
        let index = match self.groups.iter().position(|(c, _)| c == category) {
            Some(index) => index,
            None => {
                self.groups.push((category.to_string(), Vec::new()));
                self.groups.len() - 1
            }
        };

        let group = &mut self.groups[index].1;
        match group.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = path,
            None => group.push((key.to_string(), path)),
        }
    }
}

impl Serialize for PathRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        struct Group<'a>(&'a [(String, PathBuf)]);

        impl Serialize for Group<'_> {
            fn serialize<S: Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                let entries = self.0.iter().map(|(key, path)| (key, path));
                serializer.collect_map(entries)
            }
        }

        serializer.collect_map(
            self.groups
                .iter()
                .map(|(category, group)| (category, Group(group))),
        )
    }
}

/// Check and register every path in `options`
///
/// Empty entries are skipped. Relative paths are resolved against
/// `base_dir` when given, otherwise against the working directory.
pub fn register_paths(
    options: &Map<String, Value>,
    base_dir: Option<&Path>,
) -> Result<PathRegistry> {
    let mut registry = PathRegistry::default();

    for (category, group) in options {
        let Value::Object(group) = group else {
            return Err(ConfigError::malformed("Invalid paths settings."));
        };

        for (key, raw) in group {
            let raw = match raw {
                Value::Null => continue,
                Value::String(s) if s.is_empty() => continue,
                Value::String(s) => s,
                _ => {
                    let message = format!("Path {category}.{key} must be a string");
                    return Err(ConfigError::malformed(message));
                }
            };

            let candidate = match base_dir {
                Some(base) => base.join(raw),
                None => PathBuf::from(raw),
            };

            let path = candidate
                .canonicalize()
                .ok()
                .filter(|p| p.is_dir())
                .ok_or_else(|| ConfigError::path_not_found(raw.as_str()))?;

            tracing::debug!(category, key, path = %path.display(), "registered path");
            registry.insert(category, key, path);
        }
    }

    Ok(registry)
}
