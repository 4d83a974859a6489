//! Policy registry
//!
//! Policies link two devices by name. The names are stored as given at
//! creation and are not rewritten when a device is renamed or removed;
//! anything device-shaped is computed on read by joining against the
//! current `devices` table.

use rusqlite::Row;

use super::DbPool;
use super::device::exists;
use crate::address::validate_name;
use crate::{Error, Result};

/// A policy between two named devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub id: i64,
    pub device_1: String,
    pub device_2: String,
}

impl Policy {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            device_1: row.get(1)?,
            device_2: row.get(2)?,
        })
    }
}

/// Device on the other side of a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDevice {
    pub name: String,
    pub ipv4: String,
    pub mac: String,
}

/// Policy registry backed by the `policies` table
#[derive(Clone)]
pub struct PolicyRegistry {
    pool: DbPool,
}

impl PolicyRegistry {
    /// Create a new policy registry
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a policy between two existing devices
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a name is empty or malformed, `NotFound` if
    /// either device does not exist
    pub fn create(&self, device_1: &str, device_2: &str) -> Result<Policy> {
        let device_1 = validate_name(device_1)?;
        let device_2 = validate_name(device_2)?;

        let policy = super::write(&self.pool, |tx| {
            for name in [&device_1, &device_2] {
                if !exists(tx, "name", name)? {
                    return Err(Error::NotFound(format!("no device named '{name}'")));
                }
            }

            tx.execute(
                "INSERT INTO policies (device_1, device_2) VALUES (?1, ?2)",
                [&device_1, &device_2],
            )?;

            Ok(Policy {
                id: tx.last_insert_rowid(),
                device_1: device_1.clone(),
                device_2: device_2.clone(),
            })
        })?;

        tracing::info!(
            policy_id = policy.id,
            device_1 = %policy.device_1,
            device_2 = %policy.device_2,
            "policy created"
        );
        Ok(policy)
    }

    /// Remove a policy by ID
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no policy has that ID
    pub fn remove(&self, id: i64) -> Result<()> {
        super::write(&self.pool, |tx| {
            let affected = tx.execute("DELETE FROM policies WHERE policy_id = ?1", [id])?;
            if affected == 0 {
                return Err(Error::NotFound(format!("no policy with id {id}")));
            }
            Ok(())
        })?;

        tracing::info!(policy_id = id, "policy removed");
        Ok(())
    }

    /// List all policies in ID order
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self) -> Result<Vec<Policy>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT policy_id, device_1, device_2 FROM policies ORDER BY policy_id ASC",
        )?;

        let policies = stmt
            .query_map([], Policy::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(policies)
    }

    /// Devices paired with `name` by any policy, on either side
    ///
    /// Each peer is listed once. Peers whose stored name no longer matches a
    /// registered device are skipped.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `name` is not a registered device
    pub fn peers(&self, name: &str) -> Result<Vec<PeerDevice>> {
        let name = name.trim();
        let conn = self.pool.get()?;

        if !exists(&conn, "name", name)? {
            return Err(Error::NotFound(format!("no device named '{name}'")));
        }

        let mut stmt = conn.prepare(
            r"
            SELECT DISTINCT d.name, d.ipv4, d.mac
            FROM policies p
            JOIN devices d
              ON d.name = CASE WHEN p.device_1 = ?1 THEN p.device_2 ELSE p.device_1 END
            WHERE (p.device_1 = ?1 OR p.device_2 = ?1) AND d.name <> ?1
            ORDER BY d.name ASC
            ",
        )?;

        let peers = stmt
            .query_map([name], |row| {
                Ok(PeerDevice {
                    name: row.get(0)?,
                    ipv4: row.get(1)?,
                    mac: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(peers)
    }
}
