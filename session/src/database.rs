//! Shared store connection.
//!
//! The process opens one connection at startup and every store-backed
//! component clones the handle. A failed initial connect is logged but is
//! not fatal: the next operation that needs the connection tries again, and
//! fails on its own if the store is still down.

use crate::error::{Result, SessionError};
use redis::Client;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Bound on a single connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Bound on a single command once connected.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// One attempt per call, no backoff loop: a caller that finds the store
/// down fails fast and the next caller tries again.
fn manager_config() -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(0)
        .set_connection_timeout(CONNECT_TIMEOUT)
        .set_response_timeout(RESPONSE_TIMEOUT)
}

/// Handle to the named database every store-backed component shares.
#[derive(Clone)]
pub struct Database {
    client: Client,
    name: Arc<str>,
    connection: Arc<OnceCell<ConnectionManager>>,
}

impl Database {
    /// Parse the connection string without connecting.
    ///
    /// # Arguments
    ///
    /// * `url` - Connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `name` - Database name, used as the key namespace
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConnectionString`] if `url` cannot be parsed.
    pub fn open(url: &str, name: impl Into<String>) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| SessionError::InvalidConnectionString(e.to_string()))?;

        Ok(Self {
            client,
            name: Arc::from(name.into()),
            connection: Arc::new(OnceCell::new()),
        })
    }

    /// Parse the connection string and try to connect once.
    ///
    /// The outcome of the connection attempt is logged; only an unparsable
    /// connection string is an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidConnectionString`] if `url` cannot be parsed.
    pub async fn connect(url: &str, name: impl Into<String>) -> Result<Self> {
        let database = Self::open(url, name)?;

        match database.connection().await {
            Ok(_) => tracing::info!(database = %database.name, "Connected to store"),
            Err(e) => tracing::error!(
                database = %database.name,
                error = %e,
                "Store connection failed; requests that need it will retry"
            ),
        }

        Ok(database)
    }

    /// Shared connection, established on first use.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Connection`] if the store cannot be reached.
    pub async fn connection(&self) -> Result<ConnectionManager> {
        self.connection
            .get_or_try_init(|| {
                ConnectionManager::new_with_config(self.client.clone(), manager_config())
            })
            .await
            .cloned()
            .map_err(|e| SessionError::Connection(e.to_string()))
    }

    /// Whether a connection has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// Database name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key prefix for a collection in this database: `{database}:{collection}`.
    #[must_use]
    pub fn collection(&self, collection: &str) -> String {
        format!("{}:{collection}", self.name)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
