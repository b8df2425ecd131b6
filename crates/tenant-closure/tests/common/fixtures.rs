//! Hierarchy fixtures.

use std::sync::Arc;

use helios_tenant_closure::backends::sqlite::SqliteBackend;
use helios_tenant_closure::core::RecordingSink;
use helios_tenant_closure::tenant::{ClosureEdge, TenantNodeId};

/// Shorthand for a tenant ID.
pub fn id(raw: u64) -> TenantNodeId {
    TenantNodeId::new(raw)
}

/// Creates an initialized in-memory backend.
pub fn create_backend() -> SqliteBackend {
    let backend = SqliteBackend::in_memory().expect("Failed to create SQLite backend");
    backend.init_schema().expect("Failed to initialize schema");
    backend
}

/// Creates an initialized in-memory backend whose diagnostics are recorded.
pub fn create_recording_backend() -> (SqliteBackend, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let backend = create_backend().with_sink(sink.clone());
    (backend, sink)
}

/// Inserts `(parent, child)` pairs in order. A parent of 0 creates a root.
pub fn seed(backend: &SqliteBackend, pairs: &[(u64, u64)]) {
    for &(parent, child) in pairs {
        backend
            .insert_tenant(id(parent), id(child))
            .unwrap_or_else(|e| panic!("failed to insert {} under {}: {}", child, parent, e));
    }
}

/// `1 -> 2 -> 3`
pub const CHAIN: &[(u64, u64)] = &[(0, 1), (1, 2), (2, 3)];

/// Two branches under one root plus a second root.
///
/// ```text
/// 1 ─┬─ 2 ── 3
///    └─ 4 ─┬─ 5
///          └─ 6 ── 7
/// 10 ── 11
/// ```
pub const FOREST: &[(u64, u64)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (1, 4),
    (4, 5),
    (4, 6),
    (6, 7),
    (0, 10),
    (10, 11),
];

/// Every closure row of the backend.
pub fn snapshot(backend: &SqliteBackend) -> Vec<ClosureEdge> {
    backend.edges().expect("Failed to read closure rows")
}

/// Runs raw SQL against the backend's database, bypassing the engine.
pub fn corrupt(backend: &SqliteBackend, sql: &str) {
    backend
        .get_connection()
        .expect("Failed to get connection")
        .execute_batch(sql)
        .expect("Failed to run corrupting SQL");
}
