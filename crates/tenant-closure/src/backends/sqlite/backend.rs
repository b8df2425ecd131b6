//! SQLite backend implementation.

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Transaction, TransactionBehavior};
use serde::{Deserialize, Serialize};

use crate::core::{Backend, BackendCapability, BackendKind, DiagnosticSink, RepairReport};
use crate::error::{BackendError, StorageError, StorageResult};
use crate::tenant::{ClosureEdge, TenantNodeId};

use super::engine::ClosureEngine;
use super::schema;

const BACKEND_NAME: &str = "sqlite";

/// SQLite backend owning a connection pool and a [`ClosureEngine`].
///
/// The engine never manages transactions itself. This backend supplies them:
/// each convenience method runs one engine operation inside its own
/// `BEGIN IMMEDIATE` transaction. Use [`with_transaction`](Self::with_transaction)
/// to combine several operations, or other writes, atomically.
pub struct SqliteBackend {
    pool: Pool<SqliteConnectionManager>,
    config: SqliteBackendConfig,
    is_memory: bool,
    engine: ClosureEngine,
}

impl Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend")
            .field("config", &self.config)
            .field("is_memory", &self.is_memory)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

/// Configuration for the SQLite backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteBackendConfig {
    /// Maximum number of connections in the pool. In-memory databases always
    /// use a single connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of idle connections.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u32,

    /// Enable WAL mode for better concurrency.
    #[serde(default = "default_true")]
    pub enable_wal: bool,

    /// Scan for circular references after every committed move.
    #[serde(default = "default_true")]
    pub check_cycles_after_move: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout_ms() -> u64 {
    30000
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for SqliteBackendConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout_ms: default_connection_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            enable_wal: true,
            check_cycles_after_move: true,
        }
    }
}

impl SqliteBackend {
    /// Creates a new in-memory SQLite backend.
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_config(":memory:", SqliteBackendConfig::default())
    }

    /// Opens or creates a file-based SQLite database.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_config(path, SqliteBackendConfig::default())
    }

    /// Creates a backend with custom configuration.
    pub fn with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteBackendConfig,
    ) -> StorageResult<Self> {
        let is_memory = path.as_ref().to_string_lossy() == ":memory:";

        let busy_timeout = Duration::from_millis(u64::from(config.busy_timeout_ms));
        let enable_wal = config.enable_wal && !is_memory;
        let manager = if is_memory {
            SqliteConnectionManager::memory()
        } else {
            SqliteConnectionManager::file(path.as_ref())
        };
        let manager = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            if enable_wal {
                conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get::<_, String>(0)
                })?;
            }
            Ok(())
        });

        // Every in-memory connection is a separate database, so the single
        // connection must never be recycled.
        let mut builder = Pool::builder()
            .connection_timeout(Duration::from_millis(config.connection_timeout_ms));
        let max_size = if is_memory {
            builder = builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None);
            1
        } else {
            let max_size = config.max_connections.max(1);
            builder = builder
                .max_size(max_size)
                .min_idle(Some(config.min_connections.min(max_size)));
            max_size
        };

        let pool = builder.build(manager).map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })
        })?;

        tracing::debug!(
            path = %path.as_ref().display(),
            is_memory,
            max_size,
            "Opened SQLite tenant closure store"
        );

        Ok(Self {
            pool,
            config,
            is_memory,
            engine: ClosureEngine::new(),
        })
    }

    /// Routes engine diagnostics to the given sink instead of `tracing`.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.engine = ClosureEngine::with_sink(sink);
        self
    }

    /// Initialize the database schema.
    pub fn init_schema(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::initialize_schema(&conn)
    }

    /// Get a connection from the pool.
    pub fn get_connection(&self) -> StorageResult<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Returns the closure engine.
    pub fn engine(&self) -> &ClosureEngine {
        &self.engine
    }

    /// Returns whether this is an in-memory database.
    pub fn is_memory(&self) -> bool {
        self.is_memory
    }

    /// Returns the backend configuration.
    pub fn config(&self) -> &SqliteBackendConfig {
        &self.config
    }

    /// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// Commits if `f` returns `Ok`, rolls back otherwise. The write lock is
    /// taken up front so that the reads a move makes before writing cannot be
    /// invalidated by another writer.
    pub fn with_transaction<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> StorageResult<T>,
    {
        let mut conn = self.get_connection()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| transaction_error("begin", e))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| transaction_error("commit", e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(
                        error = %rollback_err,
                        cause = %err,
                        "Failed to roll back tenant closure transaction"
                    );
                }
                Err(err)
            }
        }
    }

    /// Writes the closure rows of a new tenant in its own transaction.
    pub fn insert_tenant(
        &self,
        parent_id: TenantNodeId,
        new_id: TenantNodeId,
    ) -> StorageResult<()> {
        self.with_transaction(|tx| self.engine.insert_node(tx, parent_id, new_id))
    }

    /// Moves a subtree in its own transaction.
    ///
    /// Once the move has committed, the table is scanned for circular
    /// references if [`SqliteBackendConfig::check_cycles_after_move`] is set.
    /// Findings are reported as a warning and do not undo the move.
    pub fn move_tenant(
        &self,
        tenant_id: TenantNodeId,
        new_parent_id: TenantNodeId,
        verbose: bool,
    ) -> StorageResult<()> {
        self.with_transaction(|tx| {
            self.engine
                .move_subtree(tx, tenant_id, new_parent_id, verbose)
        })?;

        if self.config.check_cycles_after_move {
            match self.get_connection() {
                Ok(conn) => {
                    self.engine.warn_on_circular_references(&conn);
                }
                Err(e) => tracing::warn!(error = %e, "Skipped post-move cycle scan"),
            }
        }
        Ok(())
    }

    /// Returns the depth at which `ancestor_id` reaches `descendant_id`, if it does.
    pub fn is_descendant(
        &self,
        ancestor_id: TenantNodeId,
        descendant_id: TenantNodeId,
    ) -> StorageResult<Option<u32>> {
        let conn = self.get_connection()?;
        self.engine.is_descendant(&conn, ancestor_id, descendant_id)
    }

    /// Returns the parent of a tenant.
    pub fn parent_of(&self, id: TenantNodeId) -> StorageResult<Option<TenantNodeId>> {
        let conn = self.get_connection()?;
        self.engine.parent_of(&conn, id)
    }

    /// Returns the ancestors of a tenant with their depth, nearest first.
    pub fn ancestors(&self, id: TenantNodeId) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        let conn = self.get_connection()?;
        self.engine.ancestors(&conn, id)
    }

    /// Returns the descendants of a tenant with their depth, nearest first.
    pub fn descendants(&self, id: TenantNodeId) -> StorageResult<Vec<(TenantNodeId, u32)>> {
        let conn = self.get_connection()?;
        self.engine.descendants(&conn, id)
    }

    /// Returns the direct children of a tenant.
    pub fn children(&self, id: TenantNodeId) -> StorageResult<Vec<TenantNodeId>> {
        let conn = self.get_connection()?;
        self.engine.children(&conn, id)
    }

    /// Returns every closure row.
    pub fn edges(&self) -> StorageResult<Vec<ClosureEdge>> {
        let conn = self.get_connection()?;
        self.engine.edges(&conn)
    }

    /// Returns every node involved in a circular reference.
    pub fn detect_circular_references(&self) -> StorageResult<Vec<TenantNodeId>> {
        let conn = self.get_connection()?;
        self.engine.detect_circular_references(&conn)
    }

    /// Repairs the whole table in its own transaction.
    pub fn repair_all(&self) -> StorageResult<RepairReport> {
        self.with_transaction(|tx| self.engine.repair_all(tx))
    }

    /// Repairs one parent/child relationship in its own transaction.
    pub fn repair_pair(
        &self,
        tenant_id: TenantNodeId,
        parent_id: TenantNodeId,
    ) -> StorageResult<RepairReport> {
        self.with_transaction(|tx| self.engine.repair_pair(tx, tenant_id, parent_id))
    }
}

fn transaction_error(action: &str, e: rusqlite::Error) -> StorageError {
    StorageError::Backend(BackendError::Transaction {
        message: format!("failed to {} transaction: {}", action, e),
    })
}

/// Connection wrapper for SQLite.
pub struct SqliteConnection(pub(crate) PooledConnection<SqliteConnectionManager>);

impl Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection").finish()
    }
}

impl std::ops::Deref for SqliteConnection {
    type Target = rusqlite::Connection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    type Connection = SqliteConnection;

    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn capabilities(&self) -> Vec<BackendCapability> {
        vec![
            BackendCapability::Transactions,
            BackendCapability::ConditionalUpsert,
            BackendCapability::UniquePairs,
            BackendCapability::SerializableIsolation,
        ]
    }

    async fn acquire(&self) -> Result<Self::Connection, BackendError> {
        let conn = self
            .pool
            .get()
            .map_err(|e| BackendError::ConnectionFailed {
                backend_name: BACKEND_NAME.to_string(),
                message: e.to_string(),
            })?;
        Ok(SqliteConnection(conn))
    }

    async fn release(&self, _conn: Self::Connection) {
        // Connection is automatically returned to pool when dropped
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let conn = self
            .get_connection()
            .map_err(|_| BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: "Failed to get connection".to_string(),
            })?;
        conn.query_row("SELECT COUNT(*) FROM tenant_closure", [], |_| Ok(()))
            .map_err(|e| BackendError::Unavailable {
                backend_name: BACKEND_NAME.to_string(),
                message: format!("Health check failed: {}", e),
            })?;
        Ok(())
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        self.init_schema().map_err(|e| match e {
            StorageError::Backend(err) => err,
            other => BackendError::MigrationError {
                message: other.to_string(),
            },
        })
    }
}
