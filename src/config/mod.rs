//! Configuration management for the InHome gateway

pub mod file;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use self::file::GatewayConfigFile;
use crate::{Error, Result};

/// Port the web front end expects the API on
pub const DEFAULT_PORT: u16 = 8443;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Path to the `SQLite` database file
    pub db_path: PathBuf,
}

/// HTTP API server configuration
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: IpAddr,

    /// Port to listen on
    pub port: u16,
}

impl ServerConfig {
    /// Socket address to listen on
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

/// Values that take precedence over the config file (CLI flags and env)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub db_path: Option<PathBuf>,
}

/// Default database path: `~/.local/share/inhome/inhome.db` on Linux
#[must_use]
pub fn default_db_path() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(
            || PathBuf::from(".local/share/inhome"),
            |d| d.data_dir().join("inhome"),
        )
        .join("inhome.db")
}

impl Config {
    /// Load configuration (overrides > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if a configured value is invalid
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::resolve(file::load_config_file(), overrides)
    }

    /// Merge a parsed config file with overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file's bind address does not parse
    pub fn resolve(fc: GatewayConfigFile, overrides: &Overrides) -> Result<Self> {
        let defaults = ServerConfig::default();

        let file_bind = fc
            .server
            .bind
            .as_deref()
            .map(|raw| {
                raw.trim()
                    .parse::<IpAddr>()
                    .map_err(|_| Error::Config(format!("invalid bind address '{raw}'")))
            })
            .transpose()?;

        let server = ServerConfig {
            bind: overrides.bind.or(file_bind).unwrap_or(defaults.bind),
            port: overrides.port.or(fc.server.port).unwrap_or(defaults.port),
        };

        let db_path = overrides
            .db_path
            .clone()
            .or(fc.database.path)
            .unwrap_or_else(default_db_path);

        Ok(Self { server, db_path })
    }
}
