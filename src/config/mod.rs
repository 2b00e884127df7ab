//! Configuration Management
//!
//! This module loads the configuration tree and checks its overall shape.
//!
//! # Configuration Locations
//! - Explicit: `--config <path>` (`.json`, `.yaml` or `.yml`)
//! - Local: `.ormconf/config.json` (team-shareable, per-project)
//! - Global: `~/.config/ormconf/config.json` (per-user)
//!
//! # Resolution Precedence
//! 1. Explicit path (highest priority)
//! 2. Local config file
//! 3. Global config file
//!
//! # Tree Shape
//! ```json
//! {
//!   "paths": { "models": { "generated": "./models/generated" } },
//!   "manager": { "attributes": { "model_loading": "model_loading_conservative" } },
//!   "connections": {
//!     "main": {
//!       "dsn": { "adapter": "mysql", "user": "app", "pass": "secret",
//!                "hostspec": "localhost", "database": "shop",
//!                "options": { "charset": "utf8" } },
//!       "attributes": { "query_cache": { "class": "array" } },
//!       "listeners": { "connection": { "log": "tracing" } }
//!     }
//!   }
//! }
//! ```
//! Mappings keep their declaration order, so connections are opened in the
//! order they are written. Unknown top-level keys are ignored.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::dsn::Dsn;
use crate::error::{ConfigError, Result};

/// Parsed configuration tree
#[derive(Debug, Clone, Default)]
pub struct ConfigTree {
    /// `category -> subkey -> path`, checked when paths are registered
    pub paths: Option<Map<String, Value>>,

    /// Manager-level attributes and listeners
    pub manager: Option<ManagerConfig>,

    /// Connections in declaration order
    pub connections: Option<Vec<ConnectionSpec>>,
}

/// Settings applied to the connection manager itself
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    pub attributes: Map<String, Value>,
    pub listeners: Map<String, Value>,
}

/// One declared connection
///
/// The `dsn` entry stays raw until the connection is reached, so path and
/// manager errors surface before DSN errors.
#[derive(Debug, Clone)]
pub struct ConnectionSpec {
    /// Logical connection name (the key in `connections`)
    pub name: String,

    dsn: Option<Value>,

    /// Attribute key to raw value, in declaration order
    pub attributes: Map<String, Value>,

    /// Listener category to `alias -> type name` mapping
    pub listeners: Map<String, Value>,
}

impl ConfigTree {
    /// Build a tree from a parsed JSON/YAML value
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut root) = value else {
            return Err(ConfigError::malformed("Config root must be a mapping"));
        };

        let paths = match root.remove("paths") {
            None => None,
            Some(Value::Object(paths)) => Some(paths),
            Some(_) => return Err(ConfigError::malformed("Invalid paths settings.")),
        };

        let manager = match root.remove("manager") {
            None => None,
            Some(Value::Object(mut manager)) => Some(ManagerConfig {
                attributes: take_mapping(&mut manager, "attributes", "manager")?,
                listeners: take_mapping(&mut manager, "listeners", "manager")?,
            }),
            Some(_) => return Err(ConfigError::malformed("Invalid manager settings.")),
        };

        let connections = match root.remove("connections") {
            None => None,
            Some(Value::Object(connections)) => Some(
                connections
                    .into_iter()
                    .map(|(name, value)| ConnectionSpec::from_value(name, value))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Some(_) => return Err(ConfigError::malformed("Invalid connections settings.")),
        };

        Ok(Self {
            paths,
            manager,
            connections,
        })
    }

    /// Parse a JSON document
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(contents)
            .map_err(|e| ConfigError::config(format!("Invalid JSON config: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value = serde_yaml::from_str::<Value>(contents)
            .map_err(|e| ConfigError::config(format!("Invalid YAML config: {e}")))?;
        Self::from_value(value)
    }
}

impl ConnectionSpec {
    fn from_value(name: String, value: Value) -> Result<Self> {
        let Value::Object(mut entry) = value else {
            return Err(invalid_dsn(&name));
        };

        let dsn = entry.remove("dsn");
        let attributes = take_mapping(&mut entry, "attributes", &name)?;
        let listeners = take_mapping(&mut entry, "listeners", &name)?;

        Ok(Self {
            name,
            dsn,
            attributes,
            listeners,
        })
    }

    /// Parse this connection's `dsn` entry
    ///
    /// A missing entry is a `MalformedConfig` error. `pass_env` is read here.
    pub fn dsn(&self) -> Result<Dsn> {
        match &self.dsn {
            Some(value) => Dsn::from_value(&self.name, value),
            None => Err(invalid_dsn(&self.name)),
        }
    }
}

fn invalid_dsn(connection: &str) -> ConfigError {
    ConfigError::malformed(format!("Invalid DSN for connection {connection}."))
}

/// Remove `key` from `section`; absent or null yields an empty mapping
fn take_mapping(
    section: &mut Map<String, Value>,
    key: &str,
    owner: &str,
) -> Result<Map<String, Value>> {
    match section.remove(key) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => {
            let message = format!("'{key}' of {owner} must be a mapping");
            Err(ConfigError::malformed(message))
        }
    }
}

/// Configuration file location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Local config: `.ormconf/config.json` (team-shareable)
    Local,
    /// Global config: `~/.config/ormconf/config.json` (per-user)
    Global,
}

impl ConfigLocation {
    /// Path of the config file for this location
    pub fn path(self) -> Result<PathBuf> {
        match self {
            Self::Local => local_config_path(),
            Self::Global => global_config_path(),
        }
    }
}

/// Get path to local config file (`.ormconf/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        ConfigError::config(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".ormconf").join("config.json"))
}

/// Get path to global config file (`~/.config/ormconf/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::config("Could not determine user config directory"))?;

    Ok(config_dir.join("ormconf").join("config.json"))
}

/// Find the config file to use
///
/// An explicit path must exist. Otherwise the local file wins over the global one.
pub fn locate_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.exists() {
            let message = format!("Config file {} not found", path.display());
            return Err(ConfigError::config(message));
        }
        return Ok(path.to_path_buf());
    }

    for location in [ConfigLocation::Local, ConfigLocation::Global] {
        let path = location.path()?;
        if path.exists() {
            return Ok(path);
        }
    }

    Err(ConfigError::config(
        "No config file found. Pass --config or create .ormconf/config.json",
    ))
}

/// A configuration tree together with the file it was read from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub tree: ConfigTree,
    pub source: PathBuf,
}

impl LoadedConfig {
    /// Directory relative `paths` entries are resolved against
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.source.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Read and parse a config file; the format follows the file extension
pub fn load_tree(path: &Path) -> Result<ConfigTree> {
    let contents = fs::read_to_string(path)
        .map_err(|e| ConfigError::config(format!("Could not read config file: {e}")))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml" | "yml") => ConfigTree::from_yaml_str(&contents),
        _ => ConfigTree::from_json_str(&contents),
    }
}

/// Locate and load the configuration
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let source = locate_config(explicit)?;
    let tree = load_tree(&source)?;
    tracing::debug!(source = %source.display(), "loaded configuration");
    Ok(LoadedConfig { tree, source })
}
