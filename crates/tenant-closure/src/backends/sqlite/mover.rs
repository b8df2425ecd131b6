//! Subtree moves.
//!
//! A move rewrites the rows that connect the moved subtree to the rest of the
//! hierarchy and leaves the rows inside the subtree alone. Every statement
//! below works on two node sets recomputed by the statement itself:
//!
//! - `sub`: the moved tenant and its descendants, with their depth below it
//! - `sup`: the new parent and its ancestors, with their depth above it
//!
//! Both sets always contain their anchor node at depth 0, even if that node's
//! self edge is missing.

use rusqlite::{Transaction, params};

use super::engine::ClosureEngine;
use crate::core::Diagnostic;
use crate::error::{HierarchyError, QueryContext, StorageResult};
use crate::tenant::TenantNodeId;

/// Removes rows linking the subtree to ancestors outside it, except rows that
/// already have exactly the depth the new chain will give them.
const DETACH_SUBTREE: &str = "
    WITH
      sub(node_id, depth) AS (
        SELECT descendant_id, depth FROM tenant_closure WHERE ancestor_id = ?1
        UNION SELECT ?1, 0
      ),
      sup(node_id, depth) AS (
        SELECT ancestor_id, depth FROM tenant_closure WHERE descendant_id = ?2
        UNION SELECT ?2, 0 WHERE ?2 <> 0
      )
    DELETE FROM tenant_closure
    WHERE descendant_id IN (SELECT node_id FROM sub)
      AND ancestor_id NOT IN (SELECT node_id FROM sub)
      AND NOT EXISTS (
        SELECT 1 FROM sup, sub AS moved
        WHERE sup.node_id = tenant_closure.ancestor_id
          AND moved.node_id = tenant_closure.descendant_id
          AND sup.depth + moved.depth + 1 = tenant_closure.depth
      )";

/// Drops any depth-1 row into the tenant that does not come from the new parent.
const DELETE_OLD_PARENT_EDGE: &str = "
    DELETE FROM tenant_closure
    WHERE descendant_id = ?1 AND depth = 1 AND ancestor_id <> ?2";

/// Connects every node of `sup` to every node of `sub`. An existing row is
/// only overwritten by a strictly shorter depth.
const ATTACH_SUBTREE: &str = "
    WITH
      sub(node_id, depth) AS (
        SELECT descendant_id, depth FROM tenant_closure WHERE ancestor_id = ?1
        UNION SELECT ?1, 0
      ),
      sup(node_id, depth) AS (
        SELECT ancestor_id, depth FROM tenant_closure WHERE descendant_id = ?2
        UNION SELECT ?2, 0
      )
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth)
    SELECT sup.node_id, sub.node_id, sup.depth + sub.depth + 1
    FROM sup CROSS JOIN sub
    WHERE true
    ON CONFLICT (ancestor_id, descendant_id)
      DO UPDATE SET depth = excluded.depth WHERE excluded.depth < tenant_closure.depth";

/// Writes the direct parent edge, never replacing an existing depth-1 row.
const WRITE_DIRECT_EDGE: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?2, 1)
    ON CONFLICT (ancestor_id, descendant_id)
      DO UPDATE SET depth = 1 WHERE tenant_closure.depth > 1";

impl ClosureEngine {
    /// Moves a tenant and its whole subtree under a new parent.
    ///
    /// Pass [`TenantNodeId::ROOT`] as `new_parent_id` to detach the subtree
    /// into a new root. Rows between nodes inside the subtree are never
    /// touched, so relative depths below the tenant are preserved. Afterwards
    /// the tenant's ancestors are exactly the new parent and its ancestors, each
    /// one level further away.
    ///
    /// Moving a tenant to its current parent changes no row, and repeating a
    /// move is a no-op.
    ///
    /// With `verbose` set, the subtree and supertree are reported to the
    /// diagnostic sink before anything is written.
    ///
    /// # Errors
    ///
    /// - [`HierarchyError::CircularReference`] if the new parent is the tenant
    ///   or one of its descendants. Checked before any write.
    /// - [`HierarchyError::NodeNotFound`] / [`HierarchyError::ParentNotFound`]
    ///   for unknown nodes. Checked before any write.
    /// - a backend error naming the failed statement. Earlier statements of
    ///   the move stay in the caller's transaction, which must be rolled back.
    pub fn move_subtree(
        &self,
        tx: &Transaction<'_>,
        tenant_id: TenantNodeId,
        new_parent_id: TenantNodeId,
        verbose: bool,
    ) -> StorageResult<()> {
        let tenant_id = tenant_id.require_node("tenant_id")?;
        let new_parent_id = new_parent_id.require_storable("new_parent_id")?;

        if !new_parent_id.is_root()
            && (new_parent_id == tenant_id
                || self.is_descendant(tx, tenant_id, new_parent_id)?.is_some())
        {
            return Err(HierarchyError::CircularReference {
                tenant_id,
                descendant_id: new_parent_id,
            }
            .into());
        }

        if !self.node_exists(tx, tenant_id)? {
            return Err(HierarchyError::NodeNotFound { id: tenant_id }.into());
        }
        if !new_parent_id.is_root() && !self.node_exists(tx, new_parent_id)? {
            return Err(HierarchyError::ParentNotFound { id: new_parent_id }.into());
        }

        if verbose {
            self.report(Diagnostic::MovePlanned {
                tenant_id,
                new_parent_id,
                subtree: self.subtree(tx, tenant_id)?,
                supertree: self.supertree(tx, new_parent_id)?,
            });
        }

        let mut rows_detached = tx
            .execute(DETACH_SUBTREE, params![tenant_id, new_parent_id])
            .step("detach subtree from old ancestors")?;

        rows_detached += tx
            .execute(DELETE_OLD_PARENT_EDGE, params![tenant_id, new_parent_id])
            .step("delete old parent edge")?;

        let mut rows_upserted = 0;
        if !new_parent_id.is_root() {
            rows_upserted = tx
                .execute(ATTACH_SUBTREE, params![tenant_id, new_parent_id])
                .step("attach subtree to new ancestors")?;

            if self.is_descendant(tx, new_parent_id, tenant_id)? != Some(1) {
                rows_upserted += tx
                    .execute(WRITE_DIRECT_EDGE, params![new_parent_id, tenant_id])
                    .step("write direct parent edge")?;
                self.report(Diagnostic::DirectEdgeRepaired {
                    tenant_id,
                    parent_id: new_parent_id,
                });
            }
        }

        self.report(Diagnostic::MoveApplied {
            tenant_id,
            new_parent_id,
            rows_detached,
            rows_upserted,
        });
        Ok(())
    }
}
