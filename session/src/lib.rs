//! # Storefront Sessions
//!
//! Cookie-backed sessions for the storefront: a signed cookie carries the
//! session id, the record itself lives in the shared store with a
//! store-native time-to-live, and flash messages ride along inside the
//! record until the next rendered page picks them up.
//!
//! ## Lifetimes
//!
//! ```text
//! browser cookie   ├──── 24 h ────┤
//! stored record    ├──────────────────── 14 d (refreshed on save/touch) ────┤
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use storefront_session::*;
//!
//! let database = Database::connect("redis://127.0.0.1:6379", "premiumbagshop").await?;
//! let store = RedisSessionStore::new(database, DEFAULT_COLLECTION);
//! let manager = SessionManager::new(store, CookieSigner::new(secret)?, SessionConfig::default());
//!
//! let session = manager.resolve(cookie_value).await?;
//! session.flash(FlashKind::Success, "Welcome back");
//! let set_cookie = manager.commit(&session).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod database;
pub mod error;
pub mod flash;
pub mod handle;
pub mod manager;
pub mod providers;
pub mod signing;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use config::{DEFAULT_COLLECTION, DEFAULT_COOKIE_NAME, SessionConfig};
pub use database::Database;
pub use error::{Result, SessionError};
pub use flash::{FlashKind, FlashMessages};
pub use handle::{Session, SessionSnapshot};
pub use manager::SessionManager;
pub use providers::SessionStore;
pub use signing::CookieSigner;
pub use state::{Identity, Role, SessionId, SessionRecord};
pub use stores::RedisSessionStore;

#[cfg(any(test, feature = "test-utils"))]
pub use mocks::MemorySessionStore;
