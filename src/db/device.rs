//! Device registry

use rusqlite::{Connection, OptionalExtension, Row};

use super::DbPool;
use crate::address::{MacAddress, parse_ipv4, validate_name};
use crate::{Error, Result};

const DEVICE_COLUMNS: &str = "mac, name, ipv4, ipv6, date_added, is_trusted";

/// A registered device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub mac: String,
    pub name: String,
    pub ipv4: String,
    pub ipv6: Option<String>,
    /// Epoch seconds
    pub date_added: i64,
    pub is_trusted: bool,
}

impl Device {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            mac: row.get(0)?,
            name: row.get(1)?,
            ipv4: row.get(2)?,
            ipv6: row.get(3)?,
            date_added: row.get(4)?,
            is_trusted: row.get(5)?,
        })
    }
}

/// Device registry backed by the `devices` table
#[derive(Clone)]
pub struct DeviceRegistry {
    pool: DbPool,
}

impl DeviceRegistry {
    /// Create a new device registry
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Register a new device
    ///
    /// The device starts untrusted, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a field is malformed, `Conflict` if the MAC
    /// or name is already registered
    pub fn create(&self, mac: &str, ipv4: &str, name: &str) -> Result<Device> {
        let mac = mac.parse::<MacAddress>()?.to_string();
        let ipv4 = parse_ipv4(ipv4)?.to_string();
        let name = validate_name(name)?;

        let device = Device {
            mac,
            name,
            ipv4,
            ipv6: None,
            date_added: chrono::Utc::now().timestamp(),
            is_trusted: false,
        };

        super::write(&self.pool, |tx| {
            if exists(tx, "mac", &device.mac)? {
                return Err(Error::Conflict(format!(
                    "device with mac {} already exists",
                    device.mac
                )));
            }
            if exists(tx, "name", &device.name)? {
                return Err(Error::Conflict(format!(
                    "device name '{}' already exists",
                    device.name
                )));
            }

            tx.execute(
                "INSERT INTO devices (mac, name, ipv4, ipv6, date_added, is_trusted)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    device.mac,
                    device.name,
                    device.ipv4,
                    device.ipv6,
                    device.date_added,
                    device.is_trusted,
                ],
            )
            .map_err(|e| unique_to_conflict(e, &device.mac))?;
            Ok(())
        })?;

        tracing::info!(mac = %device.mac, ipv4 = %device.ipv4, name = %device.name, "device created");
        Ok(device)
    }

    /// Remove a device by MAC address
    ///
    /// Policies naming the device are left in place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed MAC, `NotFound` if no device
    /// has it
    pub fn remove(&self, mac: &str) -> Result<()> {
        let mac = mac.parse::<MacAddress>()?.to_string();

        super::write(&self.pool, |tx| {
            let affected = tx.execute("DELETE FROM devices WHERE mac = ?1", [&mac])?;
            if affected == 0 {
                return Err(Error::NotFound(format!("no device with mac {mac}")));
            }
            Ok(())
        })?;

        tracing::info!(mac = %mac, "device removed");
        Ok(())
    }

    /// Change a device's name; its MAC stays the same
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if either name is invalid, `NotFound` if
    /// `current` is not registered, `Conflict` if `new` is already taken
    pub fn rename(&self, current: &str, new: &str) -> Result<()> {
        let current = validate_name(current)?;
        let new = validate_name(new)?;

        super::write(&self.pool, |tx| {
            if !exists(tx, "name", &current)? {
                return Err(Error::NotFound(format!("no device named '{current}'")));
            }
            if exists(tx, "name", &new)? {
                return Err(Error::Conflict(format!("device name '{new}' already exists")));
            }
            tx.execute(
                "UPDATE devices SET name = ?1 WHERE name = ?2",
                [&new, &current],
            )
            .map_err(|e| unique_to_conflict(e, &new))?;
            Ok(())
        })?;

        tracing::info!(old = %current, new = %new, "device renamed");
        Ok(())
    }

    /// Mark a device as trusted or untrusted
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed MAC, `NotFound` if no device
    /// has it
    pub fn set_trusted(&self, mac: &str, trusted: bool) -> Result<()> {
        let mac = mac.parse::<MacAddress>()?.to_string();

        super::write(&self.pool, |tx| {
            let affected = tx.execute(
                "UPDATE devices SET is_trusted = ?1 WHERE mac = ?2",
                rusqlite::params![trusted, mac],
            )?;
            if affected == 0 {
                return Err(Error::NotFound(format!("no device with mac {mac}")));
            }
            Ok(())
        })?;

        tracing::info!(mac = %mac, trusted, "device trust updated");
        Ok(())
    }

    /// List all devices, newest first
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self) -> Result<Vec<Device>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY date_added DESC, name ASC"
        ))?;

        let devices = stmt
            .query_map([], Device::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(devices)
    }

    /// Find a device by name
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, name: &str) -> Result<Option<Device>> {
        let conn = self.pool.get()?;
        let device = conn
            .query_row(
                &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE name = ?1"),
                [name.trim()],
                Device::from_row,
            )
            .optional()?;

        Ok(device)
    }

    /// Find a device by MAC address
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a malformed MAC, or error if database
    /// operation fails
    pub fn find_by_mac(&self, mac: &str) -> Result<Option<Device>> {
        let mac = mac.parse::<MacAddress>()?.to_string();
        let conn = self.pool.get()?;
        let device = conn
            .query_row(
                &format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE mac = ?1"),
                [&mac],
                Device::from_row,
            )
            .optional()?;

        Ok(device)
    }
}

/// Whether a device row with `column = value` exists
pub(super) fn exists(conn: &Connection, column: &str, value: &str) -> Result<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM devices WHERE {column} = ?1"),
            [value],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn unique_to_conflict(err: rusqlite::Error, key: &str) -> Error {
    if super::is_unique_violation(&err) {
        Error::Conflict(format!("'{key}' already exists"))
    } else {
        Error::Sqlite(err)
    }
}
