//! Command-line configuration for the tenant admin tool.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TENANT_ADMIN_DATABASE` | tenants.db | SQLite database path, or `:memory:` |
//! | `TENANT_ADMIN_LOG_LEVEL` | info | Log level |
//! | `TENANT_ADMIN_BUSY_TIMEOUT_MS` | 5000 | SQLite busy timeout |
//!
//! `RUST_LOG` takes precedence over `--log-level` when set.

use clap::{Parser, Subcommand};
use helios_tenant_closure::backends::sqlite::SqliteBackendConfig;
use helios_tenant_closure::tenant::TenantNodeId;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Tenant admin configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "tenant-admin")]
#[command(about = "Inspect and maintain the tenant hierarchy closure table")]
#[command(version)]
pub struct AdminConfig {
    /// SQLite database path.
    #[arg(short, long, env = "TENANT_ADMIN_DATABASE", default_value = "tenants.db")]
    pub database: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TENANT_ADMIN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// SQLite busy timeout in milliseconds.
    #[arg(long, env = "TENANT_ADMIN_BUSY_TIMEOUT_MS", default_value = "5000")]
    pub busy_timeout_ms: u32,

    /// Log the subtree and supertree of a move before applying it.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,

    /// Skip the circular reference scan after a move.
    #[arg(long)]
    pub skip_cycle_check: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Tenant admin subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create or migrate the closure table schema.
    Init,

    /// Write the closure rows of a new tenant.
    Insert {
        /// ID of the new tenant.
        tenant: TenantNodeId,
        /// Parent tenant; 0 creates a root.
        #[arg(long, default_value = "0")]
        parent: TenantNodeId,
    },

    /// Move a tenant and its subtree under a new parent.
    Move {
        /// Tenant to move.
        tenant: TenantNodeId,
        /// New parent; 0 detaches the subtree into a root.
        #[arg(long)]
        to: TenantNodeId,
    },

    /// Check whether one tenant is an ancestor of another.
    IsDescendant {
        /// Candidate ancestor.
        ancestor: TenantNodeId,
        /// Candidate descendant.
        descendant: TenantNodeId,
    },

    /// Print the parent of a tenant.
    Parent {
        /// Tenant to look up.
        tenant: TenantNodeId,
    },

    /// List the ancestors of a tenant, nearest first.
    Ancestors {
        /// Tenant to look up.
        tenant: TenantNodeId,
    },

    /// List the descendants of a tenant, nearest first.
    Descendants {
        /// Tenant to look up.
        tenant: TenantNodeId,
    },

    /// List nodes that are their own ancestor.
    DetectCycles,

    /// Rebuild missing rows and minimize depths across the whole table.
    Repair,

    /// Repair a single parent/child relationship.
    RepairPair {
        /// Child tenant.
        tenant: TenantNodeId,
        /// Its parent.
        #[arg(long)]
        parent: TenantNodeId,
    },

    /// Print every closure row.
    Dump,
}

impl AdminConfig {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.database.trim().is_empty() {
            errors.push("Database path cannot be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.busy_timeout_ms == 0 {
            errors.push("Busy timeout cannot be 0".to_string());
        }

        match &self.command {
            Command::Insert { tenant, parent } => {
                if tenant.is_root() {
                    errors.push("Tenant ID cannot be 0".to_string());
                } else if tenant == parent {
                    errors.push(format!("Tenant {} cannot be its own parent", tenant));
                }
            }
            Command::Move { tenant, .. } => {
                if tenant.is_root() {
                    errors.push("Tenant ID cannot be 0".to_string());
                }
            }
            Command::RepairPair { tenant, parent } => {
                if tenant.is_root() || parent.is_root() {
                    errors.push("Repair-pair needs two non-zero tenant IDs".to_string());
                } else if tenant == parent {
                    errors.push(format!("Tenant {} cannot be its own parent", tenant));
                }
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Backend configuration derived from the command-line options.
    pub fn backend_config(&self) -> SqliteBackendConfig {
        SqliteBackendConfig {
            busy_timeout_ms: self.busy_timeout_ms,
            check_cycles_after_move: !self.skip_cycle_check,
            ..Default::default()
        }
    }
}
