//! Closure table assertion helpers.

use std::collections::{BTreeMap, BTreeSet};

use helios_tenant_closure::backends::sqlite::SqliteBackend;
use helios_tenant_closure::error::{HierarchyError, StorageError};
use helios_tenant_closure::tenant::{ClosureEdge, TenantNodeId};

use super::fixtures::snapshot;

/// Asserts the structural invariants of a consistent table.
///
/// - every node has exactly one self edge, at depth 0
/// - no other row has depth 0
/// - every non-root node has exactly one depth-1 row
/// - a node's ancestors are its parent's ancestors plus the parent, one
///   level further away
///
/// # Panics
///
/// Panics with the offending node if any property fails.
pub fn assert_closure_consistent(backend: &SqliteBackend) {
    let edges = snapshot(backend);

    let nodes: BTreeSet<TenantNodeId> = edges
        .iter()
        .flat_map(|e| [e.ancestor, e.descendant])
        .collect();

    let mut ancestors: BTreeMap<TenantNodeId, BTreeMap<TenantNodeId, u32>> = BTreeMap::new();
    for edge in &edges {
        if edge.ancestor == edge.descendant {
            assert_eq!(edge.depth, 0, "self edge of {} has depth {}", edge.ancestor, edge.depth);
        } else {
            assert!(edge.depth > 0, "non-self edge {:?} has depth 0", edge);
            ancestors
                .entry(edge.descendant)
                .or_default()
                .insert(edge.ancestor, edge.depth);
        }
    }

    for node in &nodes {
        let self_edges = edges
            .iter()
            .filter(|e| e.ancestor == *node && e.descendant == *node)
            .count();
        assert_eq!(self_edges, 1, "tenant {} has {} self edges", node, self_edges);

        let own = ancestors.get(node).cloned().unwrap_or_default();
        let parents: Vec<_> = own.iter().filter(|(_, d)| **d == 1).collect();
        if own.is_empty() {
            continue;
        }
        assert_eq!(parents.len(), 1, "tenant {} has parents {:?}", node, parents);

        let parent = *parents[0].0;
        let mut expected: BTreeMap<TenantNodeId, u32> = ancestors
            .get(&parent)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|(a, d)| (a, d + 1))
            .collect();
        expected.insert(parent, 1);
        assert_eq!(own, expected, "ancestors of tenant {} under {}", node, parent);
    }
}

/// Asserts that the parent of `tenant` is `parent`, or that it is a root.
pub fn assert_parent(backend: &SqliteBackend, tenant: u64, parent: Option<u64>) {
    assert_eq!(
        backend.parent_of(TenantNodeId::new(tenant)).expect("parent lookup"),
        parent.map(TenantNodeId::new),
        "parent of tenant {}",
        tenant
    );
}

/// Asserts that an operation failed with a circular reference naming the pair.
pub fn assert_circular_reference<T: std::fmt::Debug>(
    result: Result<T, StorageError>,
    tenant: u64,
    descendant: u64,
) {
    match result {
        Err(StorageError::Hierarchy(HierarchyError::CircularReference {
            tenant_id,
            descendant_id,
        })) => {
            assert_eq!(tenant_id, TenantNodeId::new(tenant));
            assert_eq!(descendant_id, TenantNodeId::new(descendant));
        }
        other => panic!("expected circular reference, got {:?}", other),
    }
}

/// Builds the expected row list from `(ancestor, descendant, depth)` triples.
pub fn edges_of(rows: &[(u64, u64, u32)]) -> Vec<ClosureEdge> {
    let mut edges: Vec<_> = rows
        .iter()
        .map(|&(a, d, depth)| ClosureEdge::new(a, d, depth))
        .collect();
    edges.sort_by_key(|e| (e.ancestor, e.descendant));
    edges
}
