//! SQLite schema definitions and migrations.

use rusqlite::Connection;

use crate::error::{BackendError, StorageError, StorageResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

fn migration_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::MigrationError { message })
}

/// Initialize the database schema.
pub fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, 1)?;
        migrate_schema(conn, 1)?;
    } else if current_version < SCHEMA_VERSION {
        migrate_schema(conn, current_version)?;
    }

    Ok(())
}

/// Get the current schema version.
pub(crate) fn get_schema_version(conn: &Connection) -> StorageResult<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_error(format!("Failed to create schema_version table: {}", e)))?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.execute("DELETE FROM schema_version", [])
        .map_err(|e| migration_error(format!("Failed to clear schema_version: {}", e)))?;

    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
        .map_err(|e| migration_error(format!("Failed to set schema_version: {}", e)))?;

    Ok(())
}

/// Create the initial schema (version 1).
///
/// The primary key is the uniqueness constraint on `(ancestor_id, descendant_id)`
/// that the conditional upserts rely on.
fn create_schema_v1(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS tenant_closure (
            ancestor_id INTEGER NOT NULL,
            descendant_id INTEGER NOT NULL,
            depth INTEGER NOT NULL CHECK (depth >= 0),
            PRIMARY KEY (ancestor_id, descendant_id)
        )",
        [],
    )
    .map_err(|e| migration_error(format!("Failed to create tenant_closure table: {}", e)))?;

    Ok(())
}

fn migrate_schema(conn: &Connection, from_version: i32) -> StorageResult<()> {
    let mut version = from_version;

    while version < SCHEMA_VERSION {
        match version {
            1 => migrate_v1_to_v2(conn)?,
            other => {
                return Err(migration_error(format!(
                    "No migration path from schema version {}",
                    other
                )));
            }
        }
        version += 1;
        set_schema_version(conn, version)?;
        tracing::debug!(version, "Applied tenant closure schema migration");
    }

    Ok(())
}

/// v2: index for parent and ancestor lookups by descendant.
fn migrate_v1_to_v2(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tenant_closure_descendant
            ON tenant_closure(descendant_id, depth)",
        [],
    )
    .map_err(|e| migration_error(format!("Failed to create descendant index: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_schema_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrates_v1_database() {
        let conn = Connection::open_in_memory().unwrap();
        get_schema_version(&conn).unwrap();
        create_schema_v1(&conn).unwrap();
        set_schema_version(&conn, 1).unwrap();

        initialize_schema(&conn).unwrap();

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name = 'idx_tenant_closure_descendant'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_pair_uniqueness_and_depth_check() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (1, 2, 1)",
            [],
        )
        .unwrap();
        let duplicate = conn.execute(
            "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (1, 2, 3)",
            [],
        );
        assert!(duplicate.is_err());

        let negative = conn.execute(
            "INSERT INTO tenant_closure (ancestor_id, descendant_id, depth) VALUES (1, 3, -1)",
            [],
        );
        assert!(negative.is_err());
    }
}
