//! Tracing setup for the ormconf CLI
//!
//! Logs go to stderr so stdout stays JSON-only.
//!
//! Usage:
//!   ormconf --verbose check           # Debug logging
//!   RUST_LOG=ormconf=info ormconf ... # Fine-grained log control

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialize console tracing on stderr
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = if verbose {
        // Verbose mode: debug level unless RUST_LOG is explicitly set
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
