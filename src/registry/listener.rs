//! Connection and record listeners

use std::fmt;

/// An object notified of connection or record lifecycle events
///
/// Listeners are constructed without arguments and attached under an alias.
pub trait Listener: Send + Sync + fmt::Debug {
    /// Name the listener was registered under
    fn class_name(&self) -> &str;

    /// Called once when the listener is attached to `target` under `alias`
    fn on_attach(&self, _target: &str, _alias: &str) {}
}

/// Listener that ignores every event
#[derive(Debug, Clone)]
pub struct NoopListener {
    class_name: String,
}

impl NoopListener {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

impl Listener for NoopListener {
    fn class_name(&self) -> &str {
        &self.class_name
    }
}

/// Listener that reports events through `tracing`
#[derive(Debug, Clone)]
pub struct TracingListener {
    class_name: String,
}

impl TracingListener {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

impl Listener for TracingListener {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn on_attach(&self, target: &str, alias: &str) {
        tracing::debug!(target_name = target, alias, "tracing listener attached");
    }
}
