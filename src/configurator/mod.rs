//! Connection Configurator
//!
//! Turns a [`ConfigTree`] into calls against a [`ConnectionManager`].
//!
//! # Processing Order
//! 1. `paths`: every declared directory is checked and registered
//! 2. `manager`: attributes, then listeners, on the manager itself
//! 3. `connections`: in declaration order, each one is opened, then its
//!    attributes and listeners are applied
//!
//! The first error aborts the whole run. A connection that was already opened
//! stays open in the manager even if its attributes or listeners fail; the
//! caller is expected to discard the manager.

mod listeners;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::attribute::{apply_attributes, AttributeRegistry};
use crate::config::{ConfigTree, ConnectionSpec};
use crate::dsn::DsnFormat;
use crate::error::{ConfigError, Result};
use crate::manager::ConnectionManager;
use crate::paths::{register_paths, PathRegistry};
use crate::registry::TypeRegistry;

pub use listeners::{apply_listeners, ListenerPolicy};

/// What a configure run registered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    /// Registered paths, present when the tree had a `paths` section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathRegistry>,

    /// Opened connection names in open order, present when the tree had a
    /// `connections` section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<String>>,
}

/// Applies configuration trees to connection managers
#[derive(Debug, Clone, Default)]
pub struct Configurator {
    attributes: AttributeRegistry,
    types: TypeRegistry,
    listener_policy: ListenerPolicy,
    dsn_format: DsnFormat,
    base_dir: Option<PathBuf>,
}

impl Configurator {
    /// Configurator with the default attribute table and an empty type registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute_registry(mut self, registry: AttributeRegistry) -> Self {
        self.attributes = registry;
        self
    }

    #[must_use]
    pub fn with_type_registry(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub const fn with_listener_policy(mut self, policy: ListenerPolicy) -> Self {
        self.listener_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_dsn_format(mut self, format: DsnFormat) -> Self {
        self.dsn_format = format;
        self
    }

    /// Resolve relative `paths` entries against `dir` instead of the working directory
    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub const fn listener_policy(&self) -> ListenerPolicy {
        self.listener_policy
    }

    #[must_use]
    pub const fn dsn_format(&self) -> DsnFormat {
        self.dsn_format
    }

    /// Apply `tree` to `manager`
    pub fn configure<M: ConnectionManager>(
        &self,
        manager: &mut M,
        tree: &ConfigTree,
    ) -> Result<ResourceSummary> {
        let mut summary = ResourceSummary::default();

        if let Some(paths) = &tree.paths {
            summary.paths = Some(register_paths(paths, self.base_dir.as_deref())?);
        }

        if let Some(config) = &tree.manager {
            apply_attributes(manager, &config.attributes, &self.attributes, &self.types)?;
            apply_listeners(
                manager,
                &config.listeners,
                &self.types,
                self.listener_policy,
            )?;
        }

        if let Some(connections) = &tree.connections {
            let mut opened = Vec::with_capacity(connections.len());
            for spec in connections {
                self.configure_connection(manager, spec)?;
                opened.push(spec.name.clone());
            }
            summary.connections = Some(opened);
        }

        Ok(summary)
    }

    fn configure_connection<M: ConnectionManager>(
        &self,
        manager: &mut M,
        spec: &ConnectionSpec,
    ) -> Result<()> {
        let dsn = spec.dsn()?;
        let resolved = dsn.resolve(self.dsn_format);

        let conn = manager
            .open_connection(&resolved, &spec.name)
            .map_err(|e| ConfigError::connection_open_failed(&spec.name, e.to_string()))?;

        tracing::info!(
            connection = spec.name.as_str(),
            dsn = %dsn.masked(self.dsn_format),
            "opened connection"
        );

        apply_attributes(conn, &spec.attributes, &self.attributes, &self.types)?;
        apply_listeners(conn, &spec.listeners, &self.types, self.listener_policy)?;

        Ok(())
    }

    /// Base directory for relative paths, if set
    #[must_use]
    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }
}
