//! Session configuration.
//!
//! One object holds both lifetimes a session has: how long the store keeps
//! the record and how long the browser keeps the cookie. They are deliberately
//! different by default (14 days vs. 24 hours), so a record can outlive the
//! cookie that points at it.

use chrono::Duration;
use cookie::{Cookie, SameSite};

/// Default cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "connect.sid";

/// Default collection (key namespace) for session records.
pub const DEFAULT_COLLECTION: &str = "sessions";

/// Session cookie and storage configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,

    /// Collection name used to namespace stored records.
    pub collection: String,

    /// Store-side time-to-live, refreshed on every save or touch.
    ///
    /// Default: 14 days
    pub store_ttl: Duration,

    /// Cookie `Max-Age`.
    ///
    /// Default: 24 hours
    pub cookie_max_age: Duration,

    /// Set the `Secure` attribute (production only).
    pub secure: bool,

    /// Persist sessions that were never written to.
    ///
    /// When `false`, a client without a cookie only receives one after a
    /// handler stores something in its session.
    pub save_uninitialized: bool,
}

impl SessionConfig {
    /// Set the store time-to-live.
    #[must_use]
    pub const fn with_store_ttl(mut self, ttl: Duration) -> Self {
        self.store_ttl = ttl;
        self
    }

    /// Set the cookie max age.
    #[must_use]
    pub const fn with_cookie_max_age(mut self, max_age: Duration) -> Self {
        self.cookie_max_age = max_age;
        self
    }

    /// Set the `Secure` cookie attribute.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Choose whether untouched new sessions are saved.
    #[must_use]
    pub const fn with_save_uninitialized(mut self, save: bool) -> Self {
        self.save_uninitialized = save;
        self
    }

    /// Build the `Set-Cookie` value carrying a signed session id.
    #[must_use]
    pub fn session_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(cookie::time::Duration::seconds(self.cookie_max_age.num_seconds()))
            .build()
    }

    /// Build a cookie that clears the session cookie in the browser.
    #[must_use]
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), ""))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build();
        cookie.make_removal();
        cookie
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            store_ttl: Duration::days(14),
            cookie_max_age: Duration::hours(24),
            secure: false,
            save_uninitialized: true,
        }
    }
}
