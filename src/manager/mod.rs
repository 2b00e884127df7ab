//! Connection Manager Abstractions
//!
//! The configurator never talks to a database driver itself. It drives an
//! injected [`ConnectionManager`] that opens named connections, and sets
//! attributes and listeners through the [`Configurable`] trait shared by the
//! manager and its connections.
//!
//! # Implementations
//! - [`MemoryManager`]: records everything in process, opens nothing
//! - `SqliteManager` (feature `sqlite`): opens real `SQLite` connections

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::attribute::{Attribute, AttributeSetting};
use crate::registry::Listener;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Something that carries attributes and listeners
pub trait Configurable {
    /// Name used in logs and passed to listeners on attach
    fn name(&self) -> &str;

    /// Set an attribute, replacing any previous value
    fn set_attribute(&mut self, attribute: Attribute, value: AttributeSetting);

    /// Attach a connection-level listener; a colliding alias is replaced
    fn add_listener(&mut self, alias: &str, listener: Box<dyn Listener>);

    /// Attach a record-level listener; a colliding alias is replaced
    fn add_record_listener(&mut self, alias: &str, listener: Box<dyn Listener>);
}

/// Opens named connections from connection strings
pub trait ConnectionManager: Configurable {
    type Connection: Configurable;
    type Error: fmt::Display;

    /// Open a connection from `dsn` and register it under `name`
    fn open_connection(
        &mut self,
        dsn: &str,
        name: &str,
    ) -> std::result::Result<&mut Self::Connection, Self::Error>;
}

/// Errors raised by the bundled connection managers
///
/// Messages never include the connection string itself.
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("DSN has no adapter scheme")]
    MissingScheme,

    #[error("Unsupported adapter '{0}'")]
    UnsupportedAdapter(String),

    #[error("Driver error: {0}")]
    Driver(String),
}

/// Alias-keyed listeners in attach order
#[derive(Debug, Default)]
pub struct ListenerSet {
    entries: Vec<(String, Box<dyn Listener>)>,
}

impl ListenerSet {
    /// Insert under `alias`; an existing entry keeps its position but is replaced
    pub fn insert(&mut self, alias: &str, listener: Box<dyn Listener>) {
        match self.entries.iter_mut().find(|(a, _)| a == alias) {
            Some(entry) => entry.1 = listener,
            None => self.entries.push((alias.to_string(), listener)),
        }
    }

    #[must_use]
    pub fn get(&self, alias: &str) -> Option<&dyn Listener> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, l)| l.as_ref())
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attribute and listener storage shared by the bundled managers and connections
#[derive(Debug, Default)]
pub struct ConfigurableState {
    pub attributes: BTreeMap<Attribute, AttributeSetting>,
    pub listeners: ListenerSet,
    pub record_listeners: ListenerSet,
}

impl ConfigurableState {
    fn set_attribute(&mut self, attribute: Attribute, value: AttributeSetting) {
        self.attributes.insert(attribute, value);
    }

    fn add_listener(&mut self, owner: &str, alias: &str, listener: Box<dyn Listener>) {
        listener.on_attach(owner, alias);
        self.listeners.insert(alias, listener);
    }

    fn add_record_listener(&mut self, owner: &str, alias: &str, listener: Box<dyn Listener>) {
        listener.on_attach(owner, alias);
        self.record_listeners.insert(alias, listener);
    }
}

/// Extract the adapter scheme (`mysql` in `mysql://...`, `sqlite` in `sqlite::memory:`)
pub fn adapter_of(dsn: &str) -> std::result::Result<&str, ManagerError> {
    match dsn.split_once(':') {
        Some((scheme, _)) if !scheme.is_empty() => Ok(scheme),
        _ => Err(ManagerError::MissingScheme),
    }
}

/// In-process connection manager
///
/// Connections are recorded but never opened. Re-opening an existing name
/// returns the connection already registered under it.
#[derive(Debug, Default)]
pub struct MemoryManager {
    state: ConfigurableState,
    connections: Vec<MemoryConnection>,
}

/// A connection recorded by [`MemoryManager`]
#[derive(Debug)]
pub struct MemoryConnection {
    name: String,
    adapter: String,
    dsn: String,
    state: ConfigurableState,
}

impl MemoryManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager-level attribute
    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeSetting> {
        self.state.attributes.get(&attribute)
    }

    /// All manager-level attributes
    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<Attribute, AttributeSetting> {
        &self.state.attributes
    }

    #[must_use]
    pub const fn listeners(&self) -> &ListenerSet {
        &self.state.listeners
    }

    #[must_use]
    pub const fn record_listeners(&self) -> &ListenerSet {
        &self.state.record_listeners
    }

    /// Look up an opened connection by name
    #[must_use]
    pub fn connection(&self, name: &str) -> Option<&MemoryConnection> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Opened connections, in open order
    #[must_use]
    pub fn connections(&self) -> &[MemoryConnection] {
        &self.connections
    }
}

impl Configurable for MemoryManager {
    fn name(&self) -> &str {
        "manager"
    }

    fn set_attribute(&mut self, attribute: Attribute, value: AttributeSetting) {
        self.state.set_attribute(attribute, value);
    }

    fn add_listener(&mut self, alias: &str, listener: Box<dyn Listener>) {
        self.state.add_listener("manager", alias, listener);
    }

    fn add_record_listener(&mut self, alias: &str, listener: Box<dyn Listener>) {
        self.state.add_record_listener("manager", alias, listener);
    }
}

impl ConnectionManager for MemoryManager {
    type Connection = MemoryConnection;
    type Error = ManagerError;

    fn open_connection(
        &mut self,
        dsn: &str,
        name: &str,
    ) -> std::result::Result<&mut MemoryConnection, ManagerError> {
        let adapter = adapter_of(dsn)?.to_string();

        if let Some(index) = self.connections.iter().position(|c| c.name == name) {
            tracing::debug!(connection = name, "connection already open, reusing");
            return Ok(&mut self.connections[index]);
        }

        let index = self.connections.len();
        self.connections.push(MemoryConnection {
            name: name.to_string(),
            adapter,
            dsn: dsn.to_string(),
            state: ConfigurableState::default(),
        });
        Ok(&mut self.connections[index])
    }
}

impl MemoryConnection {
    #[must_use]
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// Connection string the connection was opened with
    ///
    /// WARNING: may contain a password.
    #[must_use]
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeSetting> {
        self.state.attributes.get(&attribute)
    }

    #[must_use]
    pub fn attributes(&self) -> &BTreeMap<Attribute, AttributeSetting> {
        &self.state.attributes
    }

    #[must_use]
    pub const fn listeners(&self) -> &ListenerSet {
        &self.state.listeners
    }

    #[must_use]
    pub const fn record_listeners(&self) -> &ListenerSet {
        &self.state.record_listeners
    }
}

impl Configurable for MemoryConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_attribute(&mut self, attribute: Attribute, value: AttributeSetting) {
        self.state.set_attribute(attribute, value);
    }

    fn add_listener(&mut self, alias: &str, listener: Box<dyn Listener>) {
        self.state.add_listener(&self.name, alias, listener);
    }

    fn add_record_listener(&mut self, alias: &str, listener: Box<dyn Listener>) {
        self.state.add_record_listener(&self.name, alias, listener);
    }
}
