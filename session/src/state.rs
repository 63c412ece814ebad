//! Session record and identity types.

use crate::flash::FlashMessages;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a session.
///
/// Opaque to clients; it only ever leaves the server inside a signed cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Generate a new random `SessionId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// Which side of the shop a signed-in principal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A customer browsing and buying.
    Shopper,
    /// A shop owner managing the catalogue.
    Owner,
}

/// The principal bound to a session after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Shopper or owner.
    pub role: Role,
    /// Stable identifier of the account (e.g. its email).
    pub subject: String,
}

impl Identity {
    /// Identity for a shopper account.
    #[must_use]
    pub fn shopper(subject: impl Into<String>) -> Self {
        Self {
            role: Role::Shopper,
            subject: subject.into(),
        }
    }

    /// Identity for an owner account.
    #[must_use]
    pub fn owner(subject: impl Into<String>) -> Self {
        Self {
            role: Role::Owner,
            subject: subject.into(),
        }
    }
}

/// Server-side session state, stored as one JSON document per session.
///
/// Expiry is not tracked here: the store owns the time-to-live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier (also the storage key).
    pub id: SessionId,
    /// Arbitrary values written by handlers.
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    /// Messages waiting for the next rendered page.
    #[serde(default)]
    pub flash: FlashMessages,
    /// Signed-in principal, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    /// When the session was first created.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A fresh, empty record with a new identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            data: serde_json::Map::new(),
            flash: FlashMessages::default(),
            identity: None,
            created_at: Utc::now(),
        }
    }
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self::new()
    }
}
