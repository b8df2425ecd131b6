//! Closure rows for newly created tenants.

use rusqlite::{Transaction, params};

use super::engine::ClosureEngine;
use crate::error::{HierarchyError, QueryContext, StorageResult, ValidationError};
use crate::tenant::TenantNodeId;

impl ClosureEngine {
    /// Writes the closure rows of a newly created tenant.
    ///
    /// Inserts the self edge `(new_id, new_id, 0)`. Under a real parent it also
    /// inserts `(parent_id, new_id, 1)` and, for every ancestor `A` of the parent
    /// at depth `d`, the row `(A, new_id, d + 1)`. Pass [`TenantNodeId::ROOT`] as
    /// `parent_id` to create a new root.
    ///
    /// Purely additive. Any failure leaves the rows already written inside the
    /// caller's transaction, which the caller is expected to roll back.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] if `new_id` is zero, out of range, or equal to `parent_id`
    /// - [`HierarchyError::NodeExists`] if `new_id` already has closure rows
    /// - [`HierarchyError::ParentNotFound`] if `parent_id` has none
    /// - a backend error naming the failed statement
    pub fn insert_node(
        &self,
        tx: &Transaction<'_>,
        parent_id: TenantNodeId,
        new_id: TenantNodeId,
    ) -> StorageResult<()> {
        let new_id = new_id.require_node("new_id")?;
        let parent_id = parent_id.require_storable("parent_id")?;
        if parent_id == new_id {
            return Err(ValidationError::SelfParent { id: new_id }.into());
        }

        if self.node_exists(tx, new_id)? {
            return Err(HierarchyError::NodeExists { id: new_id }.into());
        }
        if !parent_id.is_root() && !self.node_exists(tx, parent_id)? {
            return Err(HierarchyError::ParentNotFound { id: parent_id }.into());
        }

        tx.execute(
            "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?1, 0)",
            [new_id],
        )
        .step("insert self edge")?;

        if parent_id.is_root() {
            tracing::debug!(tenant_id = %new_id, "Inserted root tenant");
            return Ok(());
        }

        tx.execute(
            "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?2, 1)",
            params![parent_id, new_id],
        )
        .step("insert parent edge")?;

        let inherited = tx
            .execute(
                "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth)
                 SELECT ancestor_id, ?2, depth + 1 FROM tenant_closure
                 WHERE descendant_id = ?1 AND ancestor_id <> ?1",
                params![parent_id, new_id],
            )
            .step("insert inherited ancestor edges")?;

        tracing::debug!(
            tenant_id = %new_id,
            parent_id = %parent_id,
            inherited,
            "Inserted tenant closure rows"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::*;
    use crate::backends::sqlite::initialize_schema;
    use crate::error::StorageError;
    use crate::tenant::ClosureEdge;

    fn id(raw: u64) -> TenantNodeId {
        TenantNodeId::new(raw)
    }

    fn connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_chain_writes_full_ancestry() {
        let mut conn = connection();
        let engine = ClosureEngine::new();
        let tx = conn.transaction().unwrap();
        engine.insert_node(&tx, TenantNodeId::ROOT, id(1)).unwrap();
        engine.insert_node(&tx, id(1), id(2)).unwrap();
        engine.insert_node(&tx, id(2), id(3)).unwrap();
        tx.commit().unwrap();

        let edges = engine.edges(&conn).unwrap();
        assert_eq!(
            edges,
            vec![
                ClosureEdge::new(1u64, 1u64, 0),
                ClosureEdge::new(1u64, 2u64, 1),
                ClosureEdge::new(1u64, 3u64, 2),
                ClosureEdge::new(2u64, 2u64, 0),
                ClosureEdge::new(2u64, 3u64, 1),
                ClosureEdge::new(3u64, 3u64, 0),
            ]
        );
    }

    #[test]
    fn test_insert_rejects_existing_node() {
        let mut conn = connection();
        let engine = ClosureEngine::new();
        let tx = conn.transaction().unwrap();
        engine.insert_node(&tx, TenantNodeId::ROOT, id(1)).unwrap();

        let err = engine.insert_node(&tx, TenantNodeId::ROOT, id(1)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Hierarchy(HierarchyError::NodeExists { id: existing })
                if existing == id(1)
        ));
    }

    #[test]
    fn test_insert_rejects_missing_parent() {
        let mut conn = connection();
        let engine = ClosureEngine::new();
        let tx = conn.transaction().unwrap();

        let err = engine.insert_node(&tx, id(7), id(8)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Hierarchy(HierarchyError::ParentNotFound { .. })
        ));
        assert!(engine.edges(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_insert_validates_ids() {
        let mut conn = connection();
        let engine = ClosureEngine::new();
        let tx = conn.transaction().unwrap();

        assert!(matches!(
            engine.insert_node(&tx, TenantNodeId::ROOT, TenantNodeId::ROOT),
            Err(StorageError::Validation(ValidationError::ZeroId { .. }))
        ));
        assert!(matches!(
            engine.insert_node(&tx, id(4), id(4)),
            Err(StorageError::Validation(ValidationError::SelfParent { .. }))
        ));
    }

    #[test]
    fn test_insert_rolled_back_with_caller_transaction() {
        let mut conn = connection();
        let engine = ClosureEngine::new();
        {
            let tx = conn.transaction().unwrap();
            engine.insert_node(&tx, TenantNodeId::ROOT, id(1)).unwrap();
            tx.rollback().unwrap();
        }
        assert!(!engine.node_exists(&conn, id(1)).unwrap());
    }
}
