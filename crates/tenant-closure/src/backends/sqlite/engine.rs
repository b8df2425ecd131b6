//! The closure engine handle.

use std::sync::Arc;

use crate::core::{Diagnostic, DiagnosticSink, TracingSink};

/// Maintains the `tenant_closure` table inside caller-supplied transactions.
///
/// The engine holds no connection and no state besides its diagnostic sink.
/// Mutating operations take a [`rusqlite::Transaction`]; read-only queries take
/// any [`rusqlite::Connection`], which a transaction dereferences to. None of
/// them begin, commit or roll back.
///
/// Operations are split by concern:
///
/// - insertion: [`insert_node`](Self::insert_node)
/// - subtree moves: [`move_subtree`](Self::move_subtree)
/// - cycle detection: [`detect_circular_references`](Self::detect_circular_references)
/// - repair: [`repair_all`](Self::repair_all), [`repair_pair`](Self::repair_pair)
/// - lookups: [`is_descendant`](Self::is_descendant), [`parent_of`](Self::parent_of),
///   [`ancestors`](Self::ancestors), [`descendants`](Self::descendants)
///
/// # Example
///
/// ```
/// use helios_tenant_closure::backends::sqlite::{initialize_schema, ClosureEngine};
/// use helios_tenant_closure::tenant::TenantNodeId;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = rusqlite::Connection::open_in_memory()?;
/// initialize_schema(&conn)?;
///
/// let engine = ClosureEngine::new();
/// let tx = conn.transaction()?;
/// engine.insert_node(&tx, TenantNodeId::ROOT, TenantNodeId::new(1))?;
/// engine.insert_node(&tx, TenantNodeId::new(1), TenantNodeId::new(2))?;
/// tx.commit()?;
///
/// assert_eq!(engine.parent_of(&conn, TenantNodeId::new(2))?, Some(TenantNodeId::new(1)));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClosureEngine {
    sink: Arc<dyn DiagnosticSink>,
}

impl Default for ClosureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ClosureEngine {
    /// Creates an engine that reports to `tracing`.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }

    /// Creates an engine that reports to the given sink.
    pub fn with_sink(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }

    /// Returns the diagnostic sink.
    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    pub(crate) fn report(&self, diagnostic: Diagnostic) {
        self.sink.record(diagnostic);
    }
}
