//! Diagnostic sink for closure operations.
//!
//! Closure operations never own a logger. They report what they did to an
//! injected [`DiagnosticSink`], which decides where the report goes. The
//! default [`TracingSink`] forwards to `tracing`; [`RecordingSink`] keeps every
//! diagnostic in memory so callers can inspect it afterwards.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::report::RepairReport;
use crate::tenant::TenantNodeId;

/// Something a closure operation wants the caller to know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The node sets a verbose subtree move is about to rewrite.
    MovePlanned {
        /// Tenant being moved.
        tenant_id: TenantNodeId,
        /// Parent it is moving under; the root sentinel for a detach.
        new_parent_id: TenantNodeId,
        /// Descendants of the tenant, including itself, with their depth.
        subtree: Vec<(TenantNodeId, u32)>,
        /// Ancestors of the new parent, including itself, with their depth.
        supertree: Vec<(TenantNodeId, u32)>,
    },

    /// A subtree move finished its statements.
    MoveApplied {
        /// Tenant that was moved.
        tenant_id: TenantNodeId,
        /// Its new parent.
        new_parent_id: TenantNodeId,
        /// Rows deleted from the old ancestry.
        rows_detached: usize,
        /// Rows inserted or shortened under the new ancestry.
        rows_upserted: usize,
    },

    /// The direct parent edge was missing after a move and had to be written.
    DirectEdgeRepaired {
        /// Child of the edge.
        tenant_id: TenantNodeId,
        /// Parent of the edge.
        parent_id: TenantNodeId,
    },

    /// Nodes caught in a mutual ancestor/descendant relationship.
    ///
    /// This is a warning only. It may be raised after the transaction that
    /// caused it has already committed.
    CircularReference {
        /// Every node involved, sorted.
        nodes: Vec<TenantNodeId>,
    },

    /// A repair pass finished.
    RepairCompleted(RepairReport),
}

impl Diagnostic {
    /// Returns `true` for diagnostics that indicate a consistency problem.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Diagnostic::CircularReference { .. } | Diagnostic::DirectEdgeRepaired { .. }
        )
    }
}

/// Receives diagnostics from closure operations.
pub trait DiagnosticSink: Send + Sync + Debug {
    /// Records one diagnostic. Must not fail.
    fn record(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::MovePlanned {
                tenant_id,
                new_parent_id,
                subtree,
                supertree,
            } => {
                tracing::info!(
                    %tenant_id,
                    %new_parent_id,
                    subtree = ?subtree,
                    supertree = ?supertree,
                    "Planning subtree move"
                );
            }
            Diagnostic::MoveApplied {
                tenant_id,
                new_parent_id,
                rows_detached,
                rows_upserted,
            } => {
                tracing::debug!(
                    %tenant_id,
                    %new_parent_id,
                    rows_detached,
                    rows_upserted,
                    "Subtree move applied"
                );
            }
            Diagnostic::DirectEdgeRepaired {
                tenant_id,
                parent_id,
            } => {
                tracing::warn!(
                    %tenant_id,
                    %parent_id,
                    "Direct parent edge was missing after move and has been written"
                );
            }
            Diagnostic::CircularReference { nodes } => {
                tracing::warn!(
                    nodes = ?nodes,
                    "Circular references detected in tenant closure table"
                );
            }
            Diagnostic::RepairCompleted(report) => {
                tracing::debug!(
                    self_edges_inserted = report.self_edges_inserted,
                    transitive_edges_inserted = report.transitive_edges_inserted,
                    depths_lowered = report.depths_lowered,
                    passes = report.passes,
                    "Closure repair completed"
                );
            }
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    recorded: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns a copy of everything recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.recorded.lock().clone()
    }

    /// Returns only the warnings recorded so far.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.recorded
            .lock()
            .iter()
            .filter(|d| d.is_warning())
            .cloned()
            .collect()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.recorded.lock())
    }
}

impl DiagnosticSink for RecordingSink {
    fn record(&self, diagnostic: Diagnostic) {
        self.recorded.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.record(Diagnostic::DirectEdgeRepaired {
            tenant_id: TenantNodeId::new(2),
            parent_id: TenantNodeId::new(1),
        });
        sink.record(Diagnostic::RepairCompleted(RepairReport::default()));

        let recorded = sink.diagnostics();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].is_warning());
        assert!(!recorded[1].is_warning());
        assert_eq!(sink.warnings().len(), 1);
    }

    #[test]
    fn test_drain_empties_sink() {
        let sink = RecordingSink::new();
        sink.record(Diagnostic::CircularReference {
            nodes: vec![TenantNodeId::new(1), TenantNodeId::new(2)],
        });
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_every_kind() {
        let sink = TracingSink;
        sink.record(Diagnostic::MovePlanned {
            tenant_id: TenantNodeId::new(2),
            new_parent_id: TenantNodeId::ROOT,
            subtree: vec![(TenantNodeId::new(2), 0)],
            supertree: vec![],
        });
        sink.record(Diagnostic::CircularReference { nodes: vec![] });
    }

    #[test]
    fn test_diagnostic_serializes_with_kind_tag() {
        let json = serde_json::to_value(Diagnostic::CircularReference {
            nodes: vec![TenantNodeId::new(7)],
        })
        .unwrap();
        assert_eq!(json["kind"], "circular_reference");
        assert_eq!(json["nodes"][0], 7);
    }
}
