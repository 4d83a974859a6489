//! Database schema and migrations

use rusqlite::Connection;

use crate::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 3;

/// Initialize the database schema
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }
    if version < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Registered devices, keyed by hardware address
        CREATE TABLE IF NOT EXISTS devices (
            mac TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            ipv4 TEXT NOT NULL,
            ipv6 TEXT,
            date_added INTEGER NOT NULL,
            is_trusted INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_devices_date_added ON devices(date_added);

        PRAGMA user_version = 1;
        ",
    )?;

    tracing::info!("migrated to schema v1");
    Ok(())
}

fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Pairwise policies; device names are point-in-time references
        CREATE TABLE IF NOT EXISTS policies (
            policy_id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_1 TEXT NOT NULL,
            device_2 TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_policies_device_1 ON policies(device_1);
        CREATE INDEX IF NOT EXISTS idx_policies_device_2 ON policies(device_2);

        PRAGMA user_version = 2;
        ",
    )?;

    tracing::info!("migrated to schema v2");
    Ok(())
}

fn migrate_v3(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- One row per committed configuration change, polled by the router
        CREATE TABLE IF NOT EXISTS revisions (
            revision_id INTEGER PRIMARY KEY AUTOINCREMENT,
            revision_date INTEGER NOT NULL
        );

        PRAGMA user_version = 3;
        ",
    )?;

    tracing::info!("migrated to schema v3 (revision log)");
    Ok(())
}
