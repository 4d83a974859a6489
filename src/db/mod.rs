//! Database module for device, policy, and revision persistence

pub mod device;
pub mod policy;
pub mod revision;
mod schema;

use std::path::Path;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::Result;

pub use device::{Device, DeviceRegistry};
pub use policy::{PeerDevice, Policy, PolicyRegistry};
pub use revision::{Revision, RevisionLog};
pub use schema::SCHEMA_VERSION;

/// Database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;

/// Pooled database connection
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
}

/// Initialize the database
///
/// # Errors
///
/// Returns error if database cannot be opened or initialized
pub fn init<P: AsRef<Path>>(path: P) -> Result<DbPool> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(path).with_init(configure_connection);
    let pool = Pool::builder().max_size(8).build(manager)?;

    // Run migrations on first connection
    let conn = pool.get()?;
    schema::init(&conn)?;

    tracing::info!(version = SCHEMA_VERSION, path = %path.display(), "database initialized");
    Ok(pool)
}

/// Initialize an in-memory database (for testing)
///
/// # Errors
///
/// Returns error if database cannot be initialized
pub fn init_memory() -> Result<DbPool> {
    // Every in-memory connection is its own database, so keep exactly one
    let manager = SqliteConnectionManager::memory().with_init(configure_connection);
    let pool = Pool::builder().max_size(1).build(manager)?;

    let conn = pool.get()?;
    schema::init(&conn)?;

    Ok(pool)
}

/// Run `f` in an immediate transaction and append a revision before commit
///
/// Taking the write lock up front serializes concurrent mutations, so
/// uniqueness checks inside `f` see every previously committed write.
/// Any error from `f` rolls the whole transaction back, revision included.
pub(crate) fn write<T>(pool: &DbPool, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
    let mut conn = pool.get()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    revision::append(&tx, chrono::Utc::now().timestamp())?;
    tx.commit()?;
    Ok(value)
}

/// Whether a `SQLite` error is a `UNIQUE`/`PRIMARY KEY` violation
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Check that the database answers a trivial query
///
/// # Errors
///
/// Returns error if no connection can be obtained or the query fails
pub fn ping(pool: &DbPool) -> Result<()> {
    let conn = pool.get()?;
    conn.query_row("SELECT 1", [], |_| Ok(()))?;
    Ok(())
}
