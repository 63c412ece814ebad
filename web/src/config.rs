//! Configuration management for the storefront.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The result is an explicit value handed to the pipeline at startup; nothing
//! downstream reads the environment.

use crate::error::StartupError;
use chrono::Duration;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use storefront_session::SessionConfig;

/// Fallback session signing secret used when `SESSION_SECRET` is unset.
///
/// Anyone who knows it can forge session cookies; startup logs a warning
/// whenever it is in use.
pub const DEFAULT_SESSION_SECRET: &str = "storefront-insecure-development-secret";

/// Default database name.
pub const DEFAULT_DATABASE_NAME: &str = "premiumbagshop";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Store connection configuration
    pub database: DatabaseConfig,
    /// Session configuration
    pub session: SessionSettings,
    /// Static assets and templates
    pub assets: AssetConfig,
    /// Deployment environment name (`production`, `development`, ...)
    pub environment: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Store connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL (required)
    pub url: String,
    /// Database name
    pub name: String,
}

/// Session configuration
#[derive(Clone)]
pub struct SessionSettings {
    /// Cookie signing secret
    pub secret: String,
    /// `true` when `secret` is the hardcoded fallback
    pub secret_is_default: bool,
    /// Store-side time-to-live
    pub store_ttl: Duration,
    /// Cookie max age
    pub cookie_max_age: Duration,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("secret", &"<redacted>")
            .field("secret_is_default", &self.secret_is_default)
            .field("store_ttl", &self.store_ttl)
            .field("cookie_max_age", &self.cookie_max_age)
            .finish()
    }
}

/// Static assets and templates
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Directory served before routing
    pub static_dir: PathBuf,
    /// Template directory
    pub views_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::MissingDatabaseUrl`] if `DATABASE_URL` is unset
    /// or empty, and [`StartupError::InvalidValue`] if a numeric variable does
    /// not parse.
    pub fn from_env() -> Result<Self, StartupError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StartupError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = var("DATABASE_URL").ok_or(StartupError::MissingDatabaseUrl)?;

        let (secret, secret_is_default) = match var("SESSION_SECRET") {
            Some(secret) => (secret, false),
            None => (DEFAULT_SESSION_SECRET.to_string(), true),
        };

        Ok(Self {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&var, "PORT", 3000)?,
            },
            database: DatabaseConfig {
                url,
                name: var("DATABASE_NAME").unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string()),
            },
            session: SessionSettings {
                secret,
                secret_is_default,
                store_ttl: seconds_or(&var, "SESSION_STORE_TTL_SECS", 14 * 24 * 60 * 60)?,
                cookie_max_age: seconds_or(&var, "SESSION_COOKIE_MAX_AGE_SECS", 24 * 60 * 60)?,
            },
            assets: AssetConfig {
                static_dir: var("STATIC_DIR").map_or_else(|| PathBuf::from("public"), PathBuf::from),
                views_dir: var("VIEWS_DIR").map_or_else(|| PathBuf::from("views"), PathBuf::from),
            },
            environment: var("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }

    /// `true` in the production environment.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Session cookie and storage settings derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_store_ttl(self.session.store_ttl)
            .with_cookie_max_age(self.session.cookie_max_age)
            .with_secure(self.is_production())
    }

    /// Socket address to bind, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, StartupError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| StartupError::InvalidValue {
            key,
            reason: e.to_string(),
        }),
        None => {
            tracing::debug!("{key} not set, using default");
            Ok(default)
        }
    }
}

/// A strictly positive number of seconds.
fn seconds_or(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: i64,
) -> Result<Duration, StartupError> {
    let secs: i64 = parse_or(var, key, default)?;
    if secs <= 0 {
        return Err(StartupError::InvalidValue {
            key,
            reason: format!("must be a positive number of seconds, got {secs}"),
        });
    }
    Duration::try_seconds(secs).ok_or_else(|| StartupError::InvalidValue {
        key,
        reason: format!("{secs} seconds is out of range"),
    })
}
