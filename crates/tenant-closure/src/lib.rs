//! Helios Tenant Closure
//!
//! This crate maintains the closure table behind the Helios tenant hierarchy.
//! For every pair of tenants where one is an ancestor of the other, the table
//! holds one `(ancestor, descendant, depth)` row, and every tenant has a
//! `(tenant, tenant, 0)` self edge. Ancestry questions become single-row
//! lookups instead of recursive walks.
//!
//! # Operations
//!
//! - **Insert**: write the rows of a newly created tenant
//! - **Move**: re-parent a tenant together with its whole subtree
//! - **Detect**: find nodes that are their own ancestor
//! - **Repair**: rebuild missing rows and minimize depths
//! - **Query**: ancestry checks, parents, ancestors and descendants
//!
//! # Architecture
//!
//! - [`tenant`] - Node identifiers and closure rows
//! - [`error`] - Error types for all operations
//! - [`core`] - Backend trait, diagnostics and repair reports
//! - [`backends`] - Backend implementations (SQLite)
//!
//! # Transactions
//!
//! The [`ClosureEngine`](backends::sqlite::ClosureEngine) never begins, commits
//! or rolls back. Each operation runs in the caller's transaction, so closure
//! maintenance composes with the caller's other writes:
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use helios_tenant_closure::backends::sqlite::SqliteBackend;
//! use helios_tenant_closure::tenant::TenantNodeId;
//!
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//!
//! backend.with_transaction(|tx| {
//!     backend.engine().insert_node(tx, TenantNodeId::ROOT, TenantNodeId::new(1))?;
//!     backend.engine().insert_node(tx, TenantNodeId::new(1), TenantNodeId::new(2))
//! })?;
//!
//! assert_eq!(
//!     backend.is_descendant(TenantNodeId::new(1), TenantNodeId::new(2))?,
//!     Some(1)
//! );
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "sqlite"))]
//! # fn main() {}
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod core;
pub mod error;
pub mod tenant;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use tenant::{ClosureEdge, TenantNodeId};

// Re-export core traits
pub use core::{Backend, BackendKind, Diagnostic, DiagnosticSink, RepairReport};

#[cfg(feature = "sqlite")]
pub use backends::sqlite::{ClosureEngine, SqliteBackend, SqliteBackendConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
