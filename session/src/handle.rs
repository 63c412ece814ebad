//! Request-scoped session handle.
//!
//! One [`Session`] is attached to each request. Clones share the same state,
//! so middleware and the handler see each other's writes. The handle records
//! what happened to the session (written, regenerated, destroyed) so the
//! manager can persist exactly what is needed once the response is ready.

use crate::error::Result;
use crate::flash::{FlashKind, FlashMessages};
use crate::state::{Identity, SessionId, SessionRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Inner {
    record: SessionRecord,
    /// Id the session had when the request arrived.
    original_id: SessionId,
    /// The record was loaded from the store (as opposed to created for this request).
    persisted: bool,
    modified: bool,
    destroyed: bool,
}

/// Handle to the current request's session.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

/// What the manager needs to know about a session once the handler is done.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Record as it should be persisted.
    pub record: SessionRecord,
    /// Id the session had when the request arrived.
    pub original_id: SessionId,
    /// The record existed in the store before this request.
    pub persisted: bool,
    /// Something was written during the request.
    pub modified: bool,
    /// The session was destroyed during the request.
    pub destroyed: bool,
}

impl SessionSnapshot {
    /// The id changed during the request.
    #[must_use]
    pub fn regenerated(&self) -> bool {
        self.record.id != self.original_id
    }
}

impl Session {
    /// Wrap a record loaded from the store.
    #[must_use]
    pub fn loaded(record: SessionRecord) -> Self {
        Self::with_state(record, true)
    }

    /// Wrap a record created for this request.
    #[must_use]
    pub fn created(record: SessionRecord) -> Self {
        Self::with_state(record, false)
    }

    fn with_state(record: SessionRecord, persisted: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                original_id: record.id,
                record,
                persisted,
                modified: false,
                destroyed: false,
            })),
        }
    }

    /// Current session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.lock().record.id
    }

    /// `true` if the session did not exist before this request.
    #[must_use]
    pub fn is_new(&self) -> bool {
        !self.lock().persisted
    }

    /// Read a value stored under `key`.
    ///
    /// Returns `None` if the key is missing or holds a value of another shape.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.lock().record.data.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SessionError::Serialization`] if `value` cannot be
    /// represented as JSON.
    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut inner = self.lock();
        inner.record.data.insert(key.into(), value);
        inner.modified = true;
        Ok(())
    }

    /// Remove the value stored under `key`.
    pub fn remove(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.lock();
        let removed = inner.record.data.remove(key);
        if removed.is_some() {
            inner.modified = true;
        }
        removed
    }

    /// Queue a flash message for the next rendered page.
    pub fn flash(&self, kind: FlashKind, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.record.flash.push(kind, message);
        inner.modified = true;
    }

    /// Take every queued flash message.
    ///
    /// The session only counts as modified if something was taken.
    #[must_use]
    pub fn take_flash(&self) -> FlashMessages {
        let mut inner = self.lock();
        let messages = inner.record.flash.drain_all();
        if !messages.is_empty() {
            inner.modified = true;
        }
        messages
    }

    /// Signed-in principal, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.lock().record.identity.clone()
    }

    /// Bind `identity` to the session under a fresh id.
    pub fn sign_in(&self, identity: Identity) {
        self.regenerate();
        self.lock().record.identity = Some(identity);
    }

    /// Forget the signed-in principal, keeping the rest of the session.
    ///
    /// The session moves to a fresh id when someone was signed in.
    pub fn sign_out(&self) {
        let signed_in = self.lock().record.identity.take().is_some();
        if signed_in {
            self.regenerate();
        }
    }

    /// Move the session to a fresh id; the old record is removed on commit.
    pub fn regenerate(&self) {
        let mut inner = self.lock();
        inner.record.id = SessionId::new();
        inner.modified = true;
    }

    /// Delete the session and clear the cookie on commit.
    pub fn destroy(&self) {
        self.lock().destroyed = true;
    }

    /// Capture the state the manager persists.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            record: inner.record.clone(),
            original_id: inner.original_id,
            persisted: inner.persisted,
            modified: inner.modified,
            destroyed: inner.destroyed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
