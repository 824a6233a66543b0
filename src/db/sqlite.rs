//! SQLite open + migration helpers for the two service databases.
//!
//! The appointment store and the notification ledger are independent
//! database files with independent migration chains. Services never
//! share storage; the event envelope is the only channel between them.

use std::path::Path;

use rusqlite::Connection;
use tracing;

use super::DatabaseError;

/// Open (or create) the appointment service database and run migrations.
pub fn open_appointment_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn, APPOINTMENT_MIGRATIONS)?;
    Ok(conn)
}

/// Open (or create) the notification service database and run migrations.
pub fn open_notification_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn, NOTIFICATION_MIGRATIONS)?;
    Ok(conn)
}

/// Open an in-memory appointment database (for testing).
pub fn open_memory_appointment_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn, APPOINTMENT_MIGRATIONS)?;
    Ok(conn)
}

/// Open an in-memory notification database (for testing).
pub fn open_memory_notification_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn, NOTIFICATION_MIGRATIONS)?;
    Ok(conn)
}

const APPOINTMENT_MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/appointments/001_initial.sql"),
)];

const NOTIFICATION_MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/notifications/001_initial.sql"),
)];

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // busy_timeout lets concurrent writers queue on the file lock instead
    // of surfacing SQLITE_BUSY; conditional updates then serialize.
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}

/// Run all pending migrations from the given chain.
fn run_migrations(conn: &Connection, migrations: &[(i64, &str)]) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    for &(version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}
