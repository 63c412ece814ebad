//! In-memory session store for testing.

use crate::error::{Result, SessionError};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionRecord};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct StoredSession {
    record: SessionRecord,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner {
    sessions: HashMap<SessionId, StoredSession>,
    /// Offset applied to the wall clock, moved by [`MemorySessionStore::advance`].
    clock_offset: Duration,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            sessions: HashMap::new(),
            clock_offset: Duration::zero(),
        }
    }
}

impl Inner {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.clock_offset
    }

    /// Drop the entry if it has expired, mimicking store-native TTL.
    fn live(&mut self, session_id: SessionId) -> Option<&mut StoredSession> {
        let now = self.now();
        if self
            .sessions
            .get(&session_id)
            .is_some_and(|stored| stored.expires_at <= now)
        {
            self.sessions.remove(&session_id);
        }
        self.sessions.get_mut(&session_id)
    }
}

/// In-memory session store.
///
/// Honours time-to-live like the Redis store and can simulate both the
/// passage of time and an unreachable backend.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl MemorySessionStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the store's clock forward.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.lock();
        inner.clock_offset += by;
    }

    /// Make every subsequent operation fail with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        let mut inner = self.lock();
        let now = inner.now();
        inner.sessions.retain(|_, stored| stored.expires_at > now);
        inner.sessions.len()
    }

    /// Read a record without going through the async trait.
    #[must_use]
    pub fn get(&self, session_id: SessionId) -> Option<SessionRecord> {
        self.lock().live(session_id).map(|stored| stored.record.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SessionError::Connection("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(
        &self,
        session_id: SessionId,
    ) -> impl Future<Output = Result<Option<SessionRecord>>> + Send {
        let result = self
            .check_available()
            .map(|()| self.get(session_id));
        async move { result }
    }

    fn save(&self, record: &SessionRecord, ttl: Duration) -> impl Future<Output = Result<()>> + Send {
        let result = self.check_available().map(|()| {
            let mut inner = self.lock();
            let expires_at = inner.now() + ttl;
            inner.sessions.insert(
                record.id,
                StoredSession {
                    record: record.clone(),
                    expires_at,
                },
            );
        });
        async move { result }
    }

    fn touch(&self, session_id: SessionId, ttl: Duration) -> impl Future<Output = Result<()>> + Send {
        let result = self.check_available().map(|()| {
            let mut inner = self.lock();
            let expires_at = inner.now() + ttl;
            if let Some(stored) = inner.live(session_id) {
                stored.expires_at = expires_at;
            }
        });
        async move { result }
    }

    fn destroy(&self, session_id: SessionId) -> impl Future<Output = Result<()>> + Send {
        let result = self.check_available().map(|()| {
            self.lock().sessions.remove(&session_id);
        });
        async move { result }
    }

    fn exists(&self, session_id: SessionId) -> impl Future<Output = Result<bool>> + Send {
        let result = self
            .check_available()
            .map(|()| self.lock().live(session_id).is_some());
        async move { result }
    }

    fn ttl(&self, session_id: SessionId) -> impl Future<Output = Result<Option<Duration>>> + Send {
        let result = self.check_available().map(|()| {
            let mut inner = self.lock();
            let now = inner.now();
            inner.live(session_id).map(|stored| stored.expires_at - now)
        });
        async move { result }
    }
}
