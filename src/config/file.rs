//! TOML configuration file loading
//!
//! Supports `~/.config/inhome/gateway/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfigFile {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseFileConfig,
}

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Address to bind (e.g. "127.0.0.1")
    pub bind: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,
}

/// Database configuration
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseFileConfig {
    /// Path to the `SQLite` database file
    pub path: Option<PathBuf>,
}

/// Load the TOML config file from the standard path
///
/// Returns `GatewayConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> GatewayConfigFile {
    let Some(path) = config_file_path() else {
        return GatewayConfigFile::default();
    };

    if !path.exists() {
        return GatewayConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                GatewayConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            GatewayConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/inhome/gateway/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("inhome")
            .join("gateway")
            .join("config.toml")
    })
}
