//! Read-only lookups against the closure table.

use rusqlite::{Connection, OptionalExtension, params};

use super::engine::ClosureEngine;
use crate::error::{QueryContext, StorageResult};
use crate::tenant::{ClosureEdge, TenantNodeId};

impl ClosureEngine {
    /// Returns `true` if any closure row mentions the node.
    pub fn node_exists(&self, conn: &Connection, id: TenantNodeId) -> StorageResult<bool> {
        conn.query_row(
            "SELECT EXISTS (
                SELECT 1 FROM tenant_closure WHERE descendant_id = ?1 OR ancestor_id = ?1
             )",
            [id],
            |row| row.get(0),
        )
        .step("check node exists")
    }

    /// Returns the depth at which `ancestor_id` reaches `descendant_id`, if it does.
    ///
    /// A node reaches itself at depth 0.
    pub fn is_descendant(
        &self,
        conn: &Connection,
        ancestor_id: TenantNodeId,
        descendant_id: TenantNodeId,
    ) -> StorageResult<Option<u32>> {
        conn.query_row(
            "SELECT depth FROM tenant_closure WHERE ancestor_id = ?1 AND descendant_id = ?2",
            params![ancestor_id, descendant_id],
            |row| row.get(0),
        )
        .optional()
        .step("look up closure edge")
    }

    /// Returns the parent of a node: the ancestor of its single depth-1 row.
    ///
    /// Root nodes and unknown nodes have no parent. If corruption left more
    /// than one depth-1 row, the lowest ID is returned and a warning is logged.
    pub fn parent_of(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Option<TenantNodeId>> {
        let mut stmt = conn
            .prepare(
                "SELECT ancestor_id FROM tenant_closure
                 WHERE descendant_id = ?1 AND depth = 1
                 ORDER BY ancestor_id",
            )
            .step("prepare parent lookup")?;
        let parents = stmt
            .query_map([id], |row| row.get::<_, TenantNodeId>(0))
            .step("look up parent")?
            .collect::<Result<Vec<_>, _>>()
            .step("read parent rows")?;

        if parents.len() > 1 {
            tracing::warn!(
                tenant_id = %id,
                parents = ?parents,
                "Tenant has more than one direct parent"
            );
        }
        Ok(parents.into_iter().next())
    }

    /// Returns the ancestors of a node with their depth, nearest first.
    pub fn ancestors(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        self.node_depths(
            conn,
            "SELECT ancestor_id, depth FROM tenant_closure
             WHERE descendant_id = ?1 AND depth > 0
             ORDER BY depth, ancestor_id",
            id,
            "list ancestors",
        )
    }

    /// Returns the descendants of a node with their depth, nearest first.
    pub fn descendants(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        self.node_depths(
            conn,
            "SELECT descendant_id, depth FROM tenant_closure
             WHERE ancestor_id = ?1 AND depth > 0
             ORDER BY depth, descendant_id",
            id,
            "list descendants",
        )
    }

    /// Returns the direct children of a node.
    pub fn children(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Vec<TenantNodeId>> {
        Ok(self
            .node_depths(
                conn,
                "SELECT descendant_id, depth FROM tenant_closure
                 WHERE ancestor_id = ?1 AND depth = 1
                 ORDER BY descendant_id",
                id,
                "list children",
            )?
            .into_iter()
            .map(|(child, _)| child)
            .collect())
    }

    /// Returns every row of the closure table ordered by ancestor, then descendant.
    pub fn edges(&self, conn: &Connection) -> StorageResult<Vec<ClosureEdge>> {
        let mut stmt = conn
            .prepare(
                "SELECT ancestor_id, descendant_id, depth FROM tenant_closure
                 ORDER BY ancestor_id, descendant_id",
            )
            .step("prepare edge dump")?;
        stmt.query_map([], |row| {
            Ok(ClosureEdge {
                ancestor: row.get(0)?,
                descendant: row.get(1)?,
                depth: row.get(2)?,
            })
        })
        .step("dump edges")?
        .collect::<Result<Vec<_>, _>>()
        .step("read edge rows")
    }

    /// The node and all its descendants, the node itself at depth 0.
    pub(crate) fn subtree(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        self.node_depths(
            conn,
            "SELECT descendant_id, depth FROM tenant_closure WHERE ancestor_id = ?1
             UNION SELECT ?1, 0
             ORDER BY 2, 1",
            id,
            "compute subtree",
        )
    }

    /// The node and all its ancestors, the node itself at depth 0.
    pub(crate) fn supertree(
        &self,
        conn: &Connection,
        id: TenantNodeId,
    ) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        if id.is_root() {
            return Ok(Vec::new());
        }
        self.node_depths(
            conn,
            "SELECT ancestor_id, depth FROM tenant_closure WHERE descendant_id = ?1
             UNION SELECT ?1, 0
             ORDER BY 2, 1",
            id,
            "compute supertree",
        )
    }

    fn node_depths(
        &self,
        conn: &Connection,
        sql: &str,
        id: TenantNodeId,
        step: &'static str,
    ) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        let mut stmt = conn.prepare(sql).step(step)?;
        stmt.query_map([id], |row| Ok((row.get(0)?, row.get(1)?)))
            .step(step)?
            .collect::<Result<Vec<_>, _>>()
            .step(step)
    }
}
