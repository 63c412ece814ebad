//! Error types for session storage and cookie handling.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Failures surfaced by the session layer.
///
/// Store-level failures are deliberately coarse: the request pipeline treats
/// every one of them the same way (log and redirect), so the variants exist
/// for logging, not for branching.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// The store could not be reached.
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// A store command failed after the connection was established.
    #[error("Store operation failed: {0}")]
    Store(String),

    /// A session record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The cookie signing key was rejected.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
