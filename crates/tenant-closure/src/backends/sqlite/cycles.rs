//! Circular reference detection.

use std::collections::BTreeSet;

use rusqlite::Connection;

use super::engine::ClosureEngine;
use crate::core::Diagnostic;
use crate::error::{QueryContext, StorageResult};
use crate::tenant::TenantNodeId;

const MUTUAL_PAIRS: &str = "
    SELECT DISTINCT a.ancestor_id, a.descendant_id
    FROM tenant_closure AS a
    JOIN tenant_closure AS b
      ON a.ancestor_id = b.descendant_id AND a.descendant_id = b.ancestor_id
    WHERE a.ancestor_id <> a.descendant_id";

impl ClosureEngine {
    /// Returns every node that is both an ancestor and a descendant of some
    /// other node, sorted and without duplicates.
    ///
    /// This detects a symptom only. Missing rows and wrong depths go unnoticed;
    /// use [`repair_all`](Self::repair_all) for those.
    pub fn detect_circular_references(
        &self,
        conn: &Connection,
    ) -> StorageResult<Vec<TenantNodeId>> {
        let mut stmt = conn.prepare(MUTUAL_PAIRS).step("prepare cycle scan")?;
        let pairs = stmt
            .query_map([], |row| {
                Ok((row.get::<_, TenantNodeId>(0)?, row.get::<_, TenantNodeId>(1)?))
            })
            .step("scan for mutual ancestors")?
            .collect::<Result<Vec<_>, _>>()
            .step("read mutual ancestor rows")?;

        let nodes: BTreeSet<TenantNodeId> = pairs.into_iter().flat_map(|(a, b)| [a, b]).collect();
        Ok(nodes.into_iter().collect())
    }

    /// Runs [`detect_circular_references`](Self::detect_circular_references)
    /// and reports findings as a warning instead of an error.
    ///
    /// Meant to run after a move has already committed, so nothing is rolled
    /// back. A failing scan is logged and treated as finding nothing.
    pub fn warn_on_circular_references(&self, conn: &Connection) -> Vec<TenantNodeId> {
        match self.detect_circular_references(conn) {
            Ok(nodes) => {
                if !nodes.is_empty() {
                    self.report(Diagnostic::CircularReference {
                        nodes: nodes.clone(),
                    });
                }
                nodes
            }
            Err(e) => {
                tracing::warn!(error = %e, "Circular reference scan failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::sqlite::initialize_schema;
    use crate::core::RecordingSink;

    fn connection(rows: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        if !rows.is_empty() {
            conn.execute_batch(&format!(
                "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES {};",
                rows
            ))
            .unwrap();
        }
        conn
    }

    fn ids(raw: &[u64]) -> Vec<TenantNodeId> {
        raw.iter().copied().map(TenantNodeId::new).collect()
    }

    #[test]
    fn test_consistent_tree_has_no_cycles() {
        let conn = connection("(1, 1, 0), (2, 2, 0), (1, 2, 1)");
        let engine = ClosureEngine::new();
        assert!(engine.detect_circular_references(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_empty_table_has_no_cycles() {
        let conn = connection("");
        let engine = ClosureEngine::new();
        assert!(engine.detect_circular_references(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_mutual_pair_is_reported_once_per_node() {
        let conn = connection(
            "(1, 1, 0), (2, 2, 0), (3, 3, 0), (4, 4, 0),
             (1, 2, 1), (2, 1, 1), (2, 3, 1), (3, 2, 2), (1, 4, 1)",
        );
        let engine = ClosureEngine::new();
        assert_eq!(
            engine.detect_circular_references(&conn).unwrap(),
            ids(&[1, 2, 3])
        );
    }

    #[test]
    fn test_warning_goes_to_sink() {
        let conn = connection("(5, 6, 1), (6, 5, 1)");
        let sink = RecordingSink::new();
        let engine = ClosureEngine::with_sink(sink.clone());

        let found = engine.warn_on_circular_references(&conn);

        assert_eq!(found, ids(&[5, 6]));
        assert_eq!(
            sink.warnings(),
            vec![Diagnostic::CircularReference { nodes: ids(&[5, 6]) }]
        );
    }

    #[test]
    fn test_no_warning_when_clean() {
        let conn = connection("(1, 1, 0)");
        let sink = RecordingSink::new();
        let engine = ClosureEngine::with_sink(sink.clone());

        assert!(engine.warn_on_circular_references(&conn).is_empty());
        assert!(sink.diagnostics().is_empty());
    }
}
