//! Error types for the InHome gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the InHome gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed MAC, IPv4 or name, or an empty required field
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A unique key (MAC or device name) is already taken
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced device, policy or revision does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection pool or other database plumbing error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure with no more specific kind
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<r2d2::Error> for Error {
    fn from(e: r2d2::Error) -> Self {
        Self::Database(e.to_string())
    }
}

impl Error {
    /// Whether the error was caused by the caller rather than the server
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::Conflict(_) | Self::NotFound(_)
        )
    }
}
