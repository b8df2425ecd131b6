//! Consistency repair.
//!
//! Repairs complete and minimize the transitive closure of whatever rows
//! currently exist. They only insert rows and lower depths; deleting rows is
//! left to subtree moves, so a repair never disconnects a tenant from an
//! ancestry it currently has, even a wrong one.

use rusqlite::{Transaction, params};

use super::engine::ClosureEngine;
use crate::core::{Diagnostic, RepairReport};
use crate::error::{HierarchyError, QueryContext, StorageResult, ValidationError};
use crate::tenant::TenantNodeId;

/// Every ID that appears on either side of a row gets a self edge.
const INSERT_MISSING_SELF_EDGES: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth)
    SELECT nodes.node_id, nodes.node_id, 0
    FROM (
        SELECT ancestor_id AS node_id FROM tenant_closure
        UNION SELECT descendant_id FROM tenant_closure
    ) AS nodes
    WHERE NOT EXISTS (
        SELECT 1 FROM tenant_closure AS c
        WHERE c.ancestor_id = nodes.node_id AND c.descendant_id = nodes.node_id
    )";

const RESET_SELF_EDGE_DEPTHS: &str = "
    UPDATE tenant_closure SET depth = 0
    WHERE ancestor_id = descendant_id AND depth <> 0";

/// A -> B and B -> C imply A -> C.
const INSERT_TRANSITIVE_EDGES: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth)
    SELECT a.ancestor_id, b.descendant_id, MIN(a.depth + b.depth)
    FROM tenant_closure AS a
    JOIN tenant_closure AS b ON b.ancestor_id = a.descendant_id
    WHERE a.depth > 0 AND b.depth > 0
      AND a.ancestor_id <> b.descendant_id
      AND NOT EXISTS (
        SELECT 1 FROM tenant_closure AS c
        WHERE c.ancestor_id = a.ancestor_id AND c.descendant_id = b.descendant_id
      )
    GROUP BY a.ancestor_id, b.descendant_id";

/// Lowers a row to the shortest two-hop path through existing rows.
const LOWER_DEPTHS: &str = "
    UPDATE tenant_closure SET depth = shorter.depth
    FROM (
        SELECT a.ancestor_id AS ancestor_id,
               b.descendant_id AS descendant_id,
               MIN(a.depth + b.depth) AS depth
        FROM tenant_closure AS a
        JOIN tenant_closure AS b ON b.ancestor_id = a.descendant_id
        WHERE a.depth > 0 AND b.depth > 0
          AND a.ancestor_id <> b.descendant_id
        GROUP BY a.ancestor_id, b.descendant_id
    ) AS shorter
    WHERE tenant_closure.ancestor_id = shorter.ancestor_id
      AND tenant_closure.descendant_id = shorter.descendant_id
      AND shorter.depth < tenant_closure.depth";

const INSERT_SELF_EDGE: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?1, 0)
    ON CONFLICT (ancestor_id, descendant_id) DO NOTHING";

const WRITE_DIRECT_EDGE: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (?1, ?2, 1)
    ON CONFLICT (ancestor_id, descendant_id)
      DO UPDATE SET depth = 1 WHERE tenant_closure.depth > 1";

/// Copies the parent's ancestors onto the tenant, one level further away.
const BACKFILL_ANCESTORS: &str = "
    INSERT INTO tenant_closure (ancestor_id, descendant_id, depth)
    SELECT p.ancestor_id, ?1, p.depth + 1
    FROM tenant_closure AS p
    WHERE p.descendant_id = ?2
      AND p.ancestor_id <> ?2
      AND p.ancestor_id <> ?1
      AND NOT EXISTS (
        SELECT 1 FROM tenant_closure AS c
        WHERE c.ancestor_id = p.ancestor_id AND c.descendant_id = ?1
      )";

impl ClosureEngine {
    /// Brings the whole table to the minimum-depth transitive closure of its rows.
    ///
    /// 1. Every node mentioned in any row gets its `(N, N, 0)` row.
    /// 2. Missing transitive rows are inserted.
    /// 3. Rows with a shorter path through other rows get that depth.
    ///
    /// Steps 2 and 3 repeat until neither changes anything, so running the
    /// repair a second time reports no changes. Rows are never deleted.
    pub fn repair_all(&self, tx: &Transaction<'_>) -> StorageResult<RepairReport> {
        let mut report = RepairReport {
            self_edges_inserted: tx
                .execute(INSERT_MISSING_SELF_EDGES, [])
                .step("insert missing self edges")?,
            depths_lowered: tx
                .execute(RESET_SELF_EDGE_DEPTHS, [])
                .step("reset self edge depths")?,
            ..Default::default()
        };

        loop {
            report.passes += 1;
            let inserted = tx
                .execute(INSERT_TRANSITIVE_EDGES, [])
                .step("complete transitive edges")?;
            let lowered = tx.execute(LOWER_DEPTHS, []).step("minimize depths")?;

            report.transitive_edges_inserted += inserted;
            report.depths_lowered += lowered;

            tracing::debug!(pass = report.passes, inserted, lowered, "Closure repair pass");
            if inserted == 0 && lowered == 0 {
                break;
            }
        }

        self.report(Diagnostic::RepairCompleted(report));
        Ok(report)
    }

    /// Repairs a single parent/child relationship.
    ///
    /// Ensures both self edges and the direct edge `(parent_id, tenant_id, 1)`
    /// exist, then copies every ancestor of the parent onto the tenant where the
    /// tenant lacks that row. Existing rows are kept, except that a longer row
    /// from the parent is shortened to depth 1.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] for zero or equal IDs
    /// - [`HierarchyError::CircularReference`] if the tenant is already an
    ///   ancestor of the parent. Checked before any write.
    pub fn repair_pair(
        &self,
        tx: &Transaction<'_>,
        tenant_id: TenantNodeId,
        parent_id: TenantNodeId,
    ) -> StorageResult<RepairReport> {
        let tenant_id = tenant_id.require_node("tenant_id")?;
        let parent_id = parent_id.require_node("parent_id")?;
        if tenant_id == parent_id {
            return Err(ValidationError::SelfParent { id: tenant_id }.into());
        }
        if self.is_descendant(tx, tenant_id, parent_id)?.is_some() {
            return Err(HierarchyError::CircularReference {
                tenant_id,
                descendant_id: parent_id,
            }
            .into());
        }

        let mut report = RepairReport {
            passes: 1,
            ..Default::default()
        };
        for node in [parent_id, tenant_id] {
            report.self_edges_inserted += tx
                .execute(INSERT_SELF_EDGE, [node])
                .step("insert missing self edge")?;
        }

        let existing = self.is_descendant(tx, parent_id, tenant_id)?;
        let written = tx
            .execute(WRITE_DIRECT_EDGE, params![parent_id, tenant_id])
            .step("write direct parent edge")?;
        match existing {
            None => report.transitive_edges_inserted += written,
            Some(_) => report.depths_lowered += written,
        }

        report.transitive_edges_inserted += tx
            .execute(BACKFILL_ANCESTORS, params![tenant_id, parent_id])
            .step("back-fill inherited ancestor edges")?;

        tracing::debug!(
            tenant_id = %tenant_id,
            parent_id = %parent_id,
            rows_changed = report.rows_changed(),
            "Repaired tenant parent edge"
        );
        self.report(Diagnostic::RepairCompleted(report));
        Ok(report)
    }
}
