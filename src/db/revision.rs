//! Revision log
//!
//! The routing engine caches devices and policies and only reloads them when
//! the latest revision moves past the one it last saw.

use rusqlite::{Connection, OptionalExtension};

use super::DbPool;
use crate::Result;

/// A committed configuration change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revision {
    pub id: i64,
    /// Epoch seconds
    pub date: i64,
}

/// Read access to the `revisions` table
#[derive(Clone)]
pub struct RevisionLog {
    pool: DbPool,
}

impl RevisionLog {
    /// Create a new revision log
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent revision, if any change was ever committed
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn latest(&self) -> Result<Option<Revision>> {
        let conn = self.pool.get()?;
        let revision = conn
            .query_row(
                "SELECT revision_id, revision_date FROM revisions
                 ORDER BY revision_id DESC LIMIT 1",
                [],
                |row| {
                    Ok(Revision {
                        id: row.get(0)?,
                        date: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(revision)
    }
}

/// Append a revision; callers run this inside the mutation's transaction
pub(super) fn append(conn: &Connection, date: i64) -> Result<i64> {
    conn.execute("INSERT INTO revisions (revision_date) VALUES (?1)", [date])?;
    Ok(conn.last_insert_rowid())
}
