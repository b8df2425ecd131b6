//! Closure table rows.

use serde::{Deserialize, Serialize};

use super::id::TenantNodeId;

/// One row of the closure table: `ancestor` reaches `descendant` in `depth` steps.
///
/// Every node owns exactly one self edge at depth 0, and the edge at depth 1
/// into a node identifies its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClosureEdge {
    /// The ancestor end of the path.
    pub ancestor: TenantNodeId,
    /// The descendant end of the path.
    pub descendant: TenantNodeId,
    /// Length of the shortest path between the two.
    pub depth: u32,
}

impl ClosureEdge {
    /// Creates a new edge.
    pub fn new(
        ancestor: impl Into<TenantNodeId>,
        descendant: impl Into<TenantNodeId>,
        depth: u32,
    ) -> Self {
        Self {
            ancestor: ancestor.into(),
            descendant: descendant.into(),
            depth,
        }
    }

    /// Returns the self edge of a node.
    pub fn self_edge(node: impl Into<TenantNodeId>) -> Self {
        let node = node.into();
        Self::new(node, node, 0)
    }

    /// Returns `true` for a node's own depth-0 row.
    pub fn is_self(&self) -> bool {
        self.ancestor == self.descendant && self.depth == 0
    }

    /// Returns `true` for a parent-to-child row.
    pub fn is_direct(&self) -> bool {
        self.depth == 1
    }
}
