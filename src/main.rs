//! ormconf CLI Entry Point
//!
//! Two subcommands:
//! - `check` - Run the full configuration against a bundled connection manager
//! - `dsn` - Print the resolved (password-masked) DSN of every connection
//!
//! All output to stdout is JSON-only. Logs go to stderr.

mod tracing_setup;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use ormconf::{
    load_config, ConfigError, Configurator, DsnFormat, ErrorEnvelope, ListenerPolicy,
    MemoryManager, Metadata, ResourceSummary, SuccessEnvelope, TypeRegistry,
};

/// ormconf - ORM connection configurator
#[derive(Parser)]
#[command(name = "ormconf")]
#[command(about = "Bootstrap-time ORM connection configurator")]
#[command(version)]
struct Cli {
    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply the configuration and report what was registered
    Check {
        /// Config file (default: .ormconf/config.json, then the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip listeners whose type is not registered instead of failing
        #[arg(long)]
        skip_unresolved_listeners: bool,

        /// Drop the trailing '?' of structured DSNs without options
        #[arg(long)]
        omit_empty_query: bool,

        /// Open sqlite connections for real instead of recording them
        #[cfg(feature = "sqlite")]
        #[arg(long)]
        sqlite: bool,
    },

    /// Print the resolved DSN of every connection (passwords masked)
    Dsn {
        /// Config file (default: .ormconf/config.json, then the user config dir)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Drop the trailing '?' of structured DSNs without options
        #[arg(long)]
        omit_empty_query: bool,
    },
}

#[derive(Serialize)]
struct DsnEntry {
    name: String,
    dsn: String,
}

const fn dsn_format(omit_empty_query: bool) -> DsnFormat {
    if omit_empty_query {
        DsnFormat::OmitEmptyQuery
    } else {
        DsnFormat::PreserveEmptyQuery
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Could not serialize output: {e}"),
    }
}

fn check(
    config: Option<PathBuf>,
    skip_unresolved_listeners: bool,
    omit_empty_query: bool,
    use_sqlite: bool,
) -> Result<(ResourceSummary, String), ConfigError> {
    let loaded = load_config(config.as_deref())?;

    let policy =
        if skip_unresolved_listeners { ListenerPolicy::Skip } else { ListenerPolicy::Strict };
    let mut configurator = Configurator::new()
        .with_type_registry(TypeRegistry::with_builtins())
        .with_listener_policy(policy)
        .with_dsn_format(dsn_format(omit_empty_query));
    if let Some(base) = loaded.base_dir() {
        configurator = configurator.with_base_dir(base);
    }

    let summary = if use_sqlite {
        configure_sqlite(&configurator, &loaded.tree)?
    } else {
        configurator.configure(&mut MemoryManager::new(), &loaded.tree)?
    };

    Ok((summary, loaded.source.display().to_string()))
}

#[cfg(feature = "sqlite")]
fn configure_sqlite(
    configurator: &Configurator,
    tree: &ormconf::ConfigTree,
) -> Result<ResourceSummary, ConfigError> {
    configurator.configure(&mut ormconf::SqliteManager::new(), tree)
}

#[cfg(not(feature = "sqlite"))]
fn configure_sqlite(
    configurator: &Configurator,
    tree: &ormconf::ConfigTree,
) -> Result<ResourceSummary, ConfigError> {
    configurator.configure(&mut MemoryManager::new(), tree)
}

fn dsn(
    config: Option<PathBuf>,
    omit_empty_query: bool,
) -> Result<(Vec<DsnEntry>, String), ConfigError> {
    let loaded = load_config(config.as_deref())?;
    let format = dsn_format(omit_empty_query);

    let entries = loaded
        .tree
        .connections
        .iter()
        .flatten()
        .map(|spec| {
            Ok(DsnEntry {
                name: spec.name.clone(),
                dsn: spec.dsn()?.masked(format),
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok((entries, loaded.source.display().to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = tracing_setup::init_tracing(cli.verbose) {
        eprintln!("Could not initialize logging: {e}");
    }

    let start = Instant::now();
    let elapsed_ms = || {
        let millis = start.elapsed().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    };

    let outcome = match cli.command {
        Commands::Check {
            config,
            skip_unresolved_listeners,
            omit_empty_query,
            #[cfg(feature = "sqlite")]
            sqlite,
        } => {
            #[cfg(not(feature = "sqlite"))]
            let sqlite = false;

            check(config, skip_unresolved_listeners, omit_empty_query, sqlite)
                .map(|(summary, source)| {
                    print_json(&SuccessEnvelope::new(
                        "check",
                        summary,
                        Metadata::with_source(elapsed_ms(), source),
                    ));
                })
                .map_err(|e| ("check", e))
        }
        Commands::Dsn {
            config,
            omit_empty_query,
        } => {
            dsn(config, omit_empty_query)
                .map(|(entries, source)| {
                    print_json(&SuccessEnvelope::new(
                        "dsn",
                        entries,
                        Metadata::with_source(elapsed_ms(), source),
                    ));
                })
                .map_err(|e| ("dsn", e))
        }
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err((command, err)) => {
            tracing::error!(code = err.error_code(), "{err}");
            print_json(&ErrorEnvelope::from_error(command, &err));
            ExitCode::FAILURE
        }
    }
}
