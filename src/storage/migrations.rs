//! Schema migrations for the pending action store.
//!
//! Each migration upgrades the schema by one version and is recorded in
//! `PRAGMA user_version`. Migrations run when the database is opened and
//! are safe to re-run.

use rusqlite::Connection;

use crate::error::TitheError;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 for a freshly created database.
pub fn get_version(conn: &Connection) -> Result<i32, TitheError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| TitheError::Storage(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), TitheError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| TitheError::Storage(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
///
/// A database written by a newer schema is refused rather than downgraded.
pub fn run(conn: &Connection) -> Result<(), TitheError> {
    let current = get_version(conn)?;

    if current > CURRENT_VERSION {
        return Err(TitheError::Storage(format!(
            "Database schema version {current} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::debug!(version, "running schema migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), TitheError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(TitheError::Storage(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: pending action store.
///
/// `AUTOINCREMENT` keeps ids strictly increasing even after rows are
/// deleted or the table is cleared.
fn migrate_v1(conn: &Connection) -> Result<(), TitheError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS pending_actions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            timestamp INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_pending_actions_timestamp
        ON pending_actions(timestamp);
        ",
    )
    .map_err(|e| TitheError::Storage(format!("Migration v1 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_v1() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO pending_actions (action_type, payload, timestamp)
             VALUES ('ADD_MEMBER', '{\"name\":\"Jane\"}', 1700000000000)",
            [],
        )
        .unwrap();

        let index_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'index' AND name = 'idx_pending_actions_timestamp'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(index_count, 1);
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        set_version(&conn, CURRENT_VERSION + 1).unwrap();

        let err = run(&conn).unwrap_err();
        assert!(matches!(err, TitheError::Storage(_)));
    }
}
