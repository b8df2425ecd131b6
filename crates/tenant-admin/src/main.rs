//! Helios Tenant Admin
//!
//! Command-line maintenance for the tenant hierarchy closure table.

mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use helios_tenant_closure::backends::sqlite::SqliteBackend;
use helios_tenant_closure::core::Backend;
use tracing::debug;

use crate::config::{AdminConfig, Command};

/// Initializes the tracing subscriber. Log output goes to stderr so that
/// command output on stdout stays machine-readable.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "tenant_admin={level},helios_tenant_closure={level}",
            level = level.to_lowercase()
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Opens the backend named by the configuration.
fn open_backend(config: &AdminConfig) -> anyhow::Result<SqliteBackend> {
    debug!(database = %config.database, "Opening tenant closure store");
    SqliteBackend::with_config(&config.database, config.backend_config())
        .with_context(|| format!("failed to open database '{}'", config.database))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AdminConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let backend = open_backend(&config)?;
    if config.command != Command::Init {
        backend
            .health_check()
            .await
            .context("closure table is not available; run `tenant-admin init` first")?;
    }

    let output = commands::run(&backend, &config.command, config.verbose).await?;
    let rendered = output.render(config.json);
    if !rendered.is_empty() {
        println!("{}", rendered);
    }

    if !output.success {
        std::process::exit(2);
    }
    Ok(())
}
