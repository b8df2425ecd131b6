//! Repair outcome reporting.

use serde::{Deserialize, Serialize};

/// Row counts written by a repair.
///
/// Repairs only ever add rows or lower depths, so the counts describe every
/// change a repair made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairReport {
    /// Missing `(N, N, 0)` rows written.
    pub self_edges_inserted: usize,
    /// Missing transitive or inherited rows written.
    pub transitive_edges_inserted: usize,
    /// Existing rows whose depth was lowered.
    pub depths_lowered: usize,
    /// Statement passes needed to reach the fixed point.
    pub passes: u32,
}

impl RepairReport {
    /// Returns `true` if the repair changed nothing.
    pub fn is_noop(&self) -> bool {
        self.rows_changed() == 0
    }

    /// Total number of rows inserted or updated.
    pub fn rows_changed(&self) -> usize {
        self.self_edges_inserted + self.transitive_edges_inserted + self.depths_lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_report_is_noop() {
        let report = RepairReport {
            passes: 3,
            ..Default::default()
        };
        assert!(report.is_noop());
    }

    #[test]
    fn test_rows_changed_sums_counts() {
        let report = RepairReport {
            self_edges_inserted: 1,
            transitive_edges_inserted: 2,
            depths_lowered: 3,
            passes: 1,
        };
        assert_eq!(report.rows_changed(), 6);
        assert!(!report.is_noop());
    }
}
