//! Error types for the tenant closure engine.
//!
//! Errors are grouped the same way callers react to them: validation problems
//! are rejected before any I/O, hierarchy violations are rejected before any
//! mutation, and backend failures carry the name of the step that failed so the
//! caller can roll back its transaction with useful context.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::tenant::TenantNodeId;

/// The primary error type for all closure operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid input, rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Structural violations of the tenant hierarchy.
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// Backend-specific errors.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised while validating node identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A node ID of zero was given where a real node is required.
    #[error("{field} must be a non-zero tenant id")]
    ZeroId { field: &'static str },

    /// The ID does not fit the signed 64-bit integer column.
    #[error("{field} {value} exceeds the largest storable tenant id")]
    IdOutOfRange { field: &'static str, value: u64 },

    /// A node cannot be its own parent.
    #[error("tenant {id} cannot be its own parent")]
    SelfParent { id: TenantNodeId },
}

/// Errors describing an impossible or missing hierarchy relationship.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// The requested parent is already a descendant of the tenant.
    #[error(
        "circular reference: tenant {tenant_id} is already an ancestor of {descendant_id}"
    )]
    CircularReference {
        tenant_id: TenantNodeId,
        descendant_id: TenantNodeId,
    },

    /// The node already has closure rows.
    #[error("tenant {id} already exists in the closure table")]
    NodeExists { id: TenantNodeId },

    /// The parent has no closure rows.
    #[error("parent tenant {id} does not exist in the closure table")]
    ParentNotFound { id: TenantNodeId },

    /// The node has no closure rows.
    #[error("tenant {id} does not exist in the closure table")]
    NodeNotFound { id: TenantNodeId },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is currently unavailable.
    #[error("backend unavailable: {backend_name}")]
    Unavailable {
        backend_name: String,
        message: String,
    },

    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// A statement of a closure operation failed.
    #[cfg(feature = "sqlite")]
    #[error("{step} failed: {source}")]
    Query {
        step: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Beginning, committing or rolling back a transaction failed.
    #[error("transaction error: {message}")]
    Transaction { message: String },
}

/// Result type alias for closure operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    /// Returns `true` if this is a circular reference rejection.
    pub fn is_circular_reference(&self) -> bool {
        matches!(
            self,
            StorageError::Hierarchy(HierarchyError::CircularReference { .. })
        )
    }
}

/// Attaches the name of the failing step to a backend error.
#[cfg(feature = "sqlite")]
pub(crate) trait QueryContext<T> {
    fn step(self, step: &'static str) -> StorageResult<T>;
}

#[cfg(feature = "sqlite")]
impl<T> QueryContext<T> for Result<T, rusqlite::Error> {
    fn step(self, step: &'static str) -> StorageResult<T> {
        self.map_err(|source| StorageError::Backend(BackendError::Query { step, source }))
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Query {
            step: "sqlite",
            source: err,
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(_err: r2d2::Error) -> Self {
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_reference_display() {
        let err = StorageError::Hierarchy(HierarchyError::CircularReference {
            tenant_id: TenantNodeId::new(1),
            descendant_id: TenantNodeId::new(3),
        });
        assert_eq!(
            err.to_string(),
            "circular reference: tenant 1 is already an ancestor of 3"
        );
        assert!(err.is_circular_reference());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::ZeroId { field: "tenant_id" };
        assert_eq!(err.to_string(), "tenant_id must be a non-zero tenant id");

        let err = ValidationError::SelfParent {
            id: TenantNodeId::new(9),
        };
        assert!(err.to_string().contains("own parent"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn test_query_error_names_step() {
        let result: Result<(), rusqlite::Error> = Err(rusqlite::Error::QueryReturnedNoRows);
        let err = result.step("detach subtree").unwrap_err();
        assert!(err.to_string().starts_with("detach subtree failed"));
        assert!(!err.is_circular_reference());
    }

    #[test]
    fn test_storage_error_from_hierarchy_error() {
        let err: StorageError = HierarchyError::NodeNotFound {
            id: TenantNodeId::new(4),
        }
        .into();
        assert!(matches!(err, StorageError::Hierarchy(_)));
    }
}
