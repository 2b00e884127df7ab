//! ormconf - ORM Connection Configurator
//!
//! ormconf runs once at application bootstrap. It reads a configuration tree,
//! opens the declared database connections through an injected connection
//! manager, and configures them: attributes (fetch modes, portability,
//! query/result caches, ...) and connection/record listeners. It also checks
//! and registers named filesystem paths.
//!
//! # Core Principles
//! - No globals: the connection manager, attribute table and type registry
//!   are passed in explicitly
//! - Fail fast: the first error aborts the run with a typed [`ConfigError`]
//! - Deterministic: connections are processed in declaration order
//! - No reflection: cache and listener types are looked up in a
//!   [`TypeRegistry`] populated at startup
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`output`] - JSON output envelope types
//! - [`config`] - Configuration loading and tree shape
//! - [`dsn`] - DSN resolution
//! - [`attribute`] - Attribute table and attribute application
//! - [`registry`] - Cache and listener type registry
//! - [`manager`] - Connection manager traits and bundled managers
//! - [`paths`] - Path registration
//! - [`configurator`] - The configure run tying everything together

pub mod attribute;
pub mod config;
pub mod configurator;
pub mod dsn;
pub mod error;
pub mod manager;
pub mod output;
pub mod paths;
pub mod registry;

// Re-export commonly used types for convenience
pub use attribute::{apply_attributes, Attribute, AttributeRegistry, AttributeSetting};
pub use config::{load_config, load_tree, ConfigLocation, ConfigTree, ConnectionSpec, LoadedConfig};
pub use configurator::{apply_listeners, Configurator, ListenerPolicy, ResourceSummary};
pub use dsn::{resolve_dsn, Dsn, DsnDescriptor, DsnFormat};
pub use error::{ConfigError, Result};
pub use manager::{Configurable, ConnectionManager, ManagerError, MemoryManager};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use paths::{register_paths, PathRegistry};
pub use registry::{Cache, Listener, TypeRegistry};

#[cfg(feature = "sqlite")]
pub use manager::sqlite::SqliteManager;
