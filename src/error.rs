//! Error Handling Infrastructure
//!
//! This module defines all error types produced while configuring connections.
//! Every error is fatal to the bootstrap step and maps to a stable error code
//! for JSON output.
//!
//! # Error Categories
//! - `MalformedConfig`: A required key or shape is missing in the config tree
//! - `MissingDsnField`: Structured DSN without one of its required fields
//! - `UnknownAttribute` / `InvalidAttributeValue`: Attribute application failures
//! - `MissingCacheClass` / `UnresolvedCacheClass`: Cache descriptor failures
//! - `UnresolvedListenerClass` / `InvalidListenerCategory`: Listener failures
//! - `PathNotFound`: Declared path is not an existing directory
//! - `ConnectionOpenFailed`: Propagated from the connection manager
//! - `Config`: Configuration file could not be located, read or parsed

use thiserror::Error;

/// Main error type for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required key or shape is missing or wrong in the config tree
    #[error("Malformed configuration: {0}")]
    MalformedConfig(String),

    /// Structured DSN is missing a required field
    #[error("DSN for connection '{connection}' is missing required field '{field}'")]
    MissingDsnField { connection: String, field: String },

    /// Attribute key is not known to the attribute registry
    #[error("{0} is not a valid attribute")]
    UnknownAttribute(String),

    /// Attribute value has a shape the attribute cannot take
    #[error("Invalid value for attribute {attribute}: {detail}")]
    InvalidAttributeValue { attribute: String, detail: String },

    /// Cache descriptor without a `class` entry
    #[error("Missing class option for cache attribute {0}")]
    MissingCacheClass(String),

    /// Cache class name not present in the type registry
    #[error("Cache class {0} does not exist")]
    UnresolvedCacheClass(String),

    /// Listener class name not present in the type registry
    #[error("Listener class {0} does not exist")]
    UnresolvedListenerClass(String),

    /// Listener grouping other than `connection` or `record`
    #[error("Invalid listener category: {0}")]
    InvalidListenerCategory(String),

    /// Declared path does not resolve to an existing directory
    #[error("{0} does not exist")]
    PathNotFound(String),

    /// Connection manager refused to open a connection
    #[error("Failed to open connection '{name}': {detail}")]
    ConnectionOpenFailed { name: String, detail: String },

    /// Configuration file error (not found, unreadable, invalid syntax)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConfigError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedConfig(_) => "MALFORMED_CONFIG",
            Self::MissingDsnField { .. } => "MISSING_DSN_FIELD",
            Self::UnknownAttribute(_) => "UNKNOWN_ATTRIBUTE",
            Self::InvalidAttributeValue { .. } => "INVALID_ATTRIBUTE_VALUE",
            Self::MissingCacheClass(_) => "MISSING_CACHE_CLASS",
            Self::UnresolvedCacheClass(_) => "UNRESOLVED_CACHE_CLASS",
            Self::UnresolvedListenerClass(_) => "UNRESOLVED_LISTENER_CLASS",
            Self::InvalidListenerCategory(_) => "INVALID_LISTENER_CATEGORY",
            Self::PathNotFound(_) => "PATH_NOT_FOUND",
            Self::ConnectionOpenFailed { .. } => "CONNECTION_OPEN_FAILED",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message
    ///
    /// Messages are built from config keys and type names only, never from
    /// resolved DSNs, so they carry no credentials.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a malformed configuration error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedConfig(message.into())
    }

    /// Create a missing DSN field error
    pub fn missing_dsn_field(connection: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingDsnField {
            connection: connection.into(),
            field: field.into(),
        }
    }

    /// Create an unknown attribute error
    pub fn unknown_attribute(key: impl Into<String>) -> Self {
        Self::UnknownAttribute(key.into())
    }

    /// Create an invalid attribute value error
    pub fn invalid_attribute_value(
        attribute: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeValue {
            attribute: attribute.into(),
            detail: detail.into(),
        }
    }

    /// Create a missing cache class error
    pub fn missing_cache_class(attribute: impl Into<String>) -> Self {
        Self::MissingCacheClass(attribute.into())
    }

    /// Create an unresolved cache class error
    pub fn unresolved_cache_class(class: impl Into<String>) -> Self {
        Self::UnresolvedCacheClass(class.into())
    }

    /// Create an unresolved listener class error
    pub fn unresolved_listener_class(class: impl Into<String>) -> Self {
        Self::UnresolvedListenerClass(class.into())
    }

    /// Create an invalid listener category error
    pub fn invalid_listener_category(category: impl Into<String>) -> Self {
        Self::InvalidListenerCategory(category.into())
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound(path.into())
    }

    /// Create a connection open failure
    pub fn connection_open_failed(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ConnectionOpenFailed {
            name: name.into(),
            detail: detail.into(),
        }
    }

    /// Create a configuration file error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
