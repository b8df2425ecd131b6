//! Backend abstraction for database drivers.
//!
//! This module defines the [`Backend`] trait implemented by every store that
//! can hold a closure table. The closure operations themselves are statement
//! sequences specific to each backend; this trait covers the lifecycle around
//! them: connections, health, and schema.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::BackendError;

/// Identifies the type of database backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQLite database (file-based or in-memory).
    Sqlite,
    /// Custom or unknown backend.
    Custom(&'static str),
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Capabilities that a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCapability {
    /// ACID transactions supplied to every operation.
    Transactions,
    /// `INSERT ... ON CONFLICT DO UPDATE ... WHERE` with a conditional overwrite.
    ConditionalUpsert,
    /// Uniqueness constraint on `(ancestor_id, descendant_id)`.
    UniquePairs,
    /// Serializable isolation for concurrent subtree moves.
    SerializableIsolation,
}

impl std::fmt::Display for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackendCapability::Transactions => "transactions",
            BackendCapability::ConditionalUpsert => "conditional-upsert",
            BackendCapability::UniquePairs => "unique-pairs",
            BackendCapability::SerializableIsolation => "serializable-isolation",
        };
        write!(f, "{}", name)
    }
}

/// A database backend that can hold a closure table.
///
/// # Example
///
/// ```ignore
/// use helios_tenant_closure::core::{Backend, BackendCapability};
///
/// if !backend.supports(BackendCapability::ConditionalUpsert) {
///     return Err("closure moves need conditional upserts".into());
/// }
/// backend.initialize().await?;
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// The type of raw connection used by this backend.
    type Connection: Send;

    /// Returns the kind of backend.
    fn kind(&self) -> BackendKind;

    /// Returns a human-readable name for this backend.
    fn name(&self) -> &'static str;

    /// Checks if this backend supports the given capability.
    fn supports(&self, capability: BackendCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Returns all capabilities supported by this backend.
    fn capabilities(&self) -> Vec<BackendCapability>;

    /// Acquires a connection from the pool.
    async fn acquire(&self) -> Result<Self::Connection, BackendError>;

    /// Returns the connection back to the pool.
    async fn release(&self, conn: Self::Connection);

    /// Checks if the backend is healthy and accepting connections.
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Initializes the database schema if needed.
    async fn initialize(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Sqlite.to_string(), "sqlite");
        assert_eq!(BackendKind::Custom("custom-db").to_string(), "custom-db");
    }

    #[test]
    fn test_backend_capability_display() {
        assert_eq!(BackendCapability::Transactions.to_string(), "transactions");
        assert_eq!(
            BackendCapability::ConditionalUpsert.to_string(),
            "conditional-upsert"
        );
    }
}
