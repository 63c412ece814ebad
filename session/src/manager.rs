//! Session lifecycle: resolve a cookie to a session, persist it afterwards.
//!
//! # Flow
//!
//! 1. **Resolve** the signed cookie value (if any) to a stored record, or
//!    start a new session when the cookie is missing, forged or stale
//! 2. **Attach** the returned [`Session`] to the request
//! 3. **Commit** once the response is ready: write, touch or delete the
//!    record and decide which cookie (if any) goes back to the client

use crate::config::SessionConfig;
use crate::error::Result;
use crate::handle::Session;
use crate::providers::SessionStore;
use crate::signing::CookieSigner;
use crate::state::SessionRecord;
use cookie::Cookie;

/// Loads and persists sessions for the request pipeline.
#[derive(Debug, Clone)]
pub struct SessionManager<S> {
    store: S,
    signer: CookieSigner,
    config: SessionConfig,
}

impl<S: SessionStore> SessionManager<S> {
    /// Create a manager.
    #[must_use]
    pub const fn new(store: S, signer: CookieSigner, config: SessionConfig) -> Self {
        Self {
            store,
            signer,
            config,
        }
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Resolve a cookie value to a session.
    ///
    /// A missing cookie, a bad signature, or an id the store no longer knows
    /// all produce a brand-new session.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    pub async fn resolve(&self, cookie_value: Option<&str>) -> Result<Session> {
        if let Some(value) = cookie_value {
            match self.signer.verify(value) {
                Some(session_id) => {
                    if let Some(record) = self.store.load(session_id).await? {
                        return Ok(Session::loaded(record));
                    }
                    tracing::debug!(session_id = %session_id, "Session cookie points at an expired session");
                }
                None => tracing::debug!("Session cookie failed signature check"),
            }
        }

        let record = SessionRecord::new();
        tracing::debug!(session_id = %record.id, "Starting new session");
        metrics::counter!("storefront.sessions.created").increment(1);

        Ok(Session::created(record))
    }

    /// Persist whatever happened to `session` during the request.
    ///
    /// # Returns
    ///
    /// The cookie to send back, if any:
    /// - a fresh session cookie whenever the record was written
    /// - a removal cookie when a stored session was destroyed
    /// - nothing for an unmodified, already-issued session
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    pub async fn commit(&self, session: &Session) -> Result<Option<Cookie<'static>>> {
        let snapshot = session.snapshot();

        if snapshot.destroyed {
            if snapshot.persisted {
                self.store.destroy(snapshot.original_id).await?;
                return Ok(Some(self.config.removal_cookie()));
            }
            return Ok(None);
        }

        let regenerated = snapshot.regenerated();
        if regenerated && snapshot.persisted {
            self.store.destroy(snapshot.original_id).await?;
        }

        let must_save = snapshot.modified
            || regenerated
            || (!snapshot.persisted && self.config.save_uninitialized);

        if must_save {
            self.store
                .save(&snapshot.record, self.config.store_ttl)
                .await?;
            let value = self.signer.sign(snapshot.record.id);
            return Ok(Some(self.config.session_cookie(value)));
        }

        if snapshot.persisted {
            self.store
                .touch(snapshot.record.id, self.config.store_ttl)
                .await?;
        }

        Ok(None)
    }
}
