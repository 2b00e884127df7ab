//! `SQLite` Connection Manager
//!
//! Opens real `SQLite` connections for `sqlite` DSNs so a configuration can
//! be checked end to end without a database server.
//!
//! # Accepted DSNs
//! - `sqlite::memory:` (in-memory database)
//! - `sqlite:///absolute/path.db`
//! - `sqlite:relative/path.db`
//!
//! A query string (`?mode=...`) is ignored. Every new connection is verified
//! with `SELECT sqlite_version()`.

use rusqlite::{Connection, OpenFlags};
use std::collections::BTreeMap;

use super::{
    adapter_of, Configurable, ConfigurableState, ConnectionManager, ListenerSet, ManagerError,
};
use crate::attribute::{Attribute, AttributeSetting};
use crate::registry::Listener;

/// Connection manager backed by `rusqlite`
#[derive(Debug, Default)]
pub struct SqliteManager {
    state: ConfigurableState,
    connections: Vec<SqliteConnection>,
}

/// An open `SQLite` connection plus its configured attributes and listeners
#[derive(Debug)]
pub struct SqliteConnection {
    name: String,
    version: String,
    conn: Connection,
    state: ConfigurableState,
}

impl SqliteManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeSetting> {
        self.state.attributes.get(&attribute)
    }

    #[must_use]
    pub fn connection(&self, name: &str) -> Option<&SqliteConnection> {
        self.connections.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn connections(&self) -> &[SqliteConnection] {
        &self.connections
    }
}

impl Configurable for SqliteManager {
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

impl ConnectionManager for SqliteManager {
    type Connection = SqliteConnection;
    type Error = ManagerError;

    fn open_connection(
        &mut self,
        dsn: &str,
        name: &str,
    ) -> std::result::Result<&mut SqliteConnection, ManagerError> {
        let adapter = adapter_of(dsn)?;
        if !adapter.eq_ignore_ascii_case("sqlite") {
            return Err(ManagerError::UnsupportedAdapter(adapter.to_string()));
        }

        if let Some(index) = self.connections.iter().position(|c| c.name == name) {
            return Ok(&mut self.connections[index]);
        }

        let conn = open(&dsn[adapter.len() + 1..])?;
        let version: String = conn
            .query_row("SELECT sqlite_version()", [], |row| row.get(0))
            .map_err(|e| ManagerError::Driver(format!("Failed to query SQLite version: {e}")))?;

        tracing::debug!(connection = name, sqlite_version = %version, "opened SQLite connection");

        let index = self.connections.len();
        self.connections.push(SqliteConnection {
            name: name.to_string(),
            version,
            conn,
            state: ConfigurableState::default(),
        });
        Ok(&mut self.connections[index])
    }
}

/// Open the database named by the part of the DSN after `sqlite:`
fn open(location: &str) -> std::result::Result<Connection, ManagerError> {
    let location = location.split('?').next().unwrap_or_default();

    if location == ":memory:" {
        return Connection::open_in_memory()
            .map_err(|e| ManagerError::Driver(format!("Failed to open in-memory database: {e}")));
    }

    let path = location.strip_prefix("//").unwrap_or(location);
    if path.is_empty() {
        return Err(ManagerError::Driver(
            "SQLite DSN names no database file".to_string(),
        ));
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
    Connection::open_with_flags(path, flags)
        .map_err(|e| ManagerError::Driver(format!("Failed to open SQLite database: {e}")))
}

impl SqliteConnection {
    /// `SQLite` library version reported by the connection
    #[must_use]
    pub fn sqlite_version(&self) -> &str {
        &self.version
    }

    /// Underlying `rusqlite` handle
    #[must_use]
    pub const fn handle(&self) -> &Connection {
        &self.conn
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

impl Configurable for SqliteConnection {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let mut manager = SqliteManager::new();
        let conn = manager.open_connection("sqlite::memory:", "main").unwrap();
        assert_eq!(conn.name(), "main");
        assert!(!conn.sqlite_version().is_empty());

        let one: i64 = conn
            .handle()
            .query_row("SELECT 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_open_file_dsn() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.db");
        let dsn = format!("sqlite://{}", file.display());

        let mut manager = SqliteManager::new();
        manager.open_connection(&dsn, "file").unwrap();
        assert!(file.exists());
    }

    #[test]
    fn test_rejects_other_adapters() {
        let mut manager = SqliteManager::new();
        let err = manager
            .open_connection("mysql://u:p@h/db?", "main")
            .unwrap_err();

        assert!(matches!(
            err,
            ManagerError::UnsupportedAdapter(ref a) if a == "mysql"
        ));
        assert!(manager.connections().is_empty());
    }

    #[test]
    fn test_rejects_empty_path() {
        let mut manager = SqliteManager::new();
        assert!(matches!(
            manager.open_connection("sqlite://", "main"),
            Err(ManagerError::Driver(_))
        ));
    }
}
