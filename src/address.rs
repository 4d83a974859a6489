//! Validation of device addresses and names
//!
//! Every value that reaches the registries goes through here first, so the
//! database only ever holds canonical forms: upper-case colon-separated MAC
//! addresses, dotted-quad IPv4 addresses and trimmed device names.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::{Error, Result};

/// Maximum length of a device name, in characters
pub const MAX_NAME_LEN: usize = 30;

/// A 48-bit hardware address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    /// Raw octets
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    /// Parse `XX:XX:XX:XX:XX:XX`, case-insensitive, `-` also accepted as separator
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidInput("mac address is required".into()));
        }

        let separator = if s.contains('-') { '-' } else { ':' };
        let mut octets = [0u8; 6];
        let mut parts = s.split(separator);

        for octet in &mut octets {
            let part = parts
                .next()
                .ok_or_else(|| Error::InvalidInput(format!("mac address '{s}' is too short")))?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::InvalidInput(format!(
                    "mac address '{s}' has a malformed octet '{part}'"
                )));
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| {
                Error::InvalidInput(format!("mac address '{s}' has a malformed octet '{part}'"))
            })?;
        }

        if parts.next().is_some() {
            return Err(Error::InvalidInput(format!("mac address '{s}' is too long")));
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

/// Parse a dotted-quad IPv4 address
///
/// # Errors
///
/// Returns `InvalidInput` if the address is empty or malformed
pub fn parse_ipv4(raw: &str) -> Result<Ipv4Addr> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("ipv4 address is required".into()));
    }
    raw.parse()
        .map_err(|_| Error::InvalidInput(format!("ipv4 address '{raw}' is malformed")))
}

/// Validate a device name and return its trimmed form
///
/// # Errors
///
/// Returns `InvalidInput` if the name is empty, too long, or contains
/// control characters
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("device name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::InvalidInput(format!(
            "device name '{name}' exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(Error::InvalidInput(
            "device name must not contain control characters".into(),
        ));
    }
    Ok(name.to_string())
}
