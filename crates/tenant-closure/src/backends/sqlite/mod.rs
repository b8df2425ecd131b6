//! SQLite backend implementation.
//!
//! [`ClosureEngine`] holds the closure-table algorithms and runs inside any
//! caller-supplied [`rusqlite::Transaction`]. [`SqliteBackend`] wraps a
//! connection pool around it for callers that do not manage transactions
//! themselves. Both in-memory databases (great for testing) and file-based
//! databases are supported.
//!
//! # Example
//!
//! ```no_run
//! use helios_tenant_closure::backends::sqlite::SqliteBackend;
//! use helios_tenant_closure::tenant::TenantNodeId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("./data/tenants.db")?;
//! backend.init_schema()?;
//!
//! backend.insert_tenant(TenantNodeId::ROOT, TenantNodeId::new(1))?;
//! backend.insert_tenant(TenantNodeId::new(1), TenantNodeId::new(2))?;
//! backend.insert_tenant(TenantNodeId::ROOT, TenantNodeId::new(3))?;
//!
//! // Re-parent tenant 2 under tenant 3
//! backend.move_tenant(TenantNodeId::new(2), TenantNodeId::new(3), false)?;
//! assert_eq!(backend.parent_of(TenantNodeId::new(2))?, Some(TenantNodeId::new(3)));
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tenant_closure (
//!     ancestor_id INTEGER NOT NULL,
//!     descendant_id INTEGER NOT NULL,
//!     depth INTEGER NOT NULL CHECK (depth >= 0),
//!     PRIMARY KEY (ancestor_id, descendant_id)
//! );
//!
//! CREATE INDEX idx_tenant_closure_descendant
//!     ON tenant_closure(descendant_id, depth);
//! ```
//!
//! A tenant with no parent is a root; it has only its self edge. The parent of
//! a tenant is never stored separately, it is the ancestor of the tenant's
//! depth-1 row.

mod backend;
mod cycles;
mod engine;
mod insert;
mod mover;
mod query;
mod repair;
mod schema;

pub use backend::{SqliteBackend, SqliteBackendConfig, SqliteConnection};
pub use engine::ClosureEngine;
pub use schema::{SCHEMA_VERSION, initialize_schema};
