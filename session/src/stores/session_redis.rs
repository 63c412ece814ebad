//! Redis-based session store implementation.
//!
//! Sessions are stored as JSON documents with store-native expiry:
//! - **Key**: `{database}:{collection}:{session_id}` → JSON-serialized `SessionRecord`
//! - **TTL**: set by `SET .. EX` on save and `EXPIRE` on touch
//!
//! # Example
//!
//! ```no_run
//! use storefront_session::{Database, RedisSessionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let database = Database::connect("redis://127.0.0.1:6379", "premiumbagshop").await?;
//! let store = RedisSessionStore::new(database, "sessions");
//! # Ok(())
//! # }
//! ```

use crate::database::Database;
use crate::error::{Result, SessionError};
use crate::providers::SessionStore;
use crate::state::{SessionId, SessionRecord};
use chrono::Duration;
use redis::AsyncCommands;

/// Redis-based session store with TTL-based expiration.
#[derive(Clone, Debug)]
pub struct RedisSessionStore {
    /// Shared connection handle.
    database: Database,
    /// Key prefix: `{database}:{collection}`.
    prefix: String,
}

impl RedisSessionStore {
    /// Create a session store over a shared database handle.
    #[must_use]
    pub fn new(database: Database, collection: &str) -> Self {
        let prefix = database.collection(collection);
        Self { database, prefix }
    }

    /// Get the Redis key for a session.
    fn session_key(&self, session_id: &SessionId) -> String {
        format!("{}:{}", self.prefix, session_id.0)
    }

    #[allow(clippy::cast_sign_loss)]
    fn ttl_seconds(ttl: Duration) -> u64 {
        // EX 0 is rejected by Redis
        ttl.num_seconds().max(1) as u64
    }
}

impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: SessionId) -> Result<Option<SessionRecord>> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&session_id);

        let document: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to get session: {e}")))?;

        document
            .map(|json| serde_json::from_str(&json).map_err(SessionError::from))
            .transpose()
    }

    async fn save(&self, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&record.id);
        let document = serde_json::to_string(record)?;
        let ttl_seconds = Self::ttl_seconds(ttl);

        let _: () = conn
            .set_ex(&key, document, ttl_seconds)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to save session: {e}")))?;

        tracing::debug!(
            session_id = %record.id,
            ttl_seconds = ttl_seconds,
            "Saved session"
        );

        Ok(())
    }

    async fn touch(&self, session_id: SessionId, ttl: Duration) -> Result<()> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&session_id);

        #[allow(clippy::cast_possible_wrap)]
        let ttl_seconds = Self::ttl_seconds(ttl) as i64;

        // EXPIRE on a missing key is a no-op returning false.
        let _: bool = conn
            .expire(&key, ttl_seconds)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to touch session: {e}")))?;

        Ok(())
    }

    async fn destroy(&self, session_id: SessionId) -> Result<()> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&session_id);

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to delete session: {e}")))?;

        tracing::info!(session_id = %session_id, "Deleted session");

        Ok(())
    }

    async fn exists(&self, session_id: SessionId) -> Result<bool> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&session_id);

        conn.exists(&key)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to check session existence: {e}")))
    }

    async fn ttl(&self, session_id: SessionId) -> Result<Option<Duration>> {
        let mut conn = self.database.connection().await?;
        let key = self.session_key(&session_id);

        let ttl_seconds: i64 = conn
            .ttl(&key)
            .await
            .map_err(|e| SessionError::Store(format!("Failed to get session TTL: {e}")))?;

        match ttl_seconds {
            -2 => Ok(None), // Key doesn't exist
            -1 => Ok(None), // Key exists but has no expiration
            seconds if seconds > 0 => Ok(Some(Duration::seconds(seconds))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::FlashKind;

    // Note: These tests require a running Redis instance
    // Run with: docker run -d -p 6379:6379 redis:7-alpine

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_key_layout() {
        let database = Database::open("redis://127.0.0.1:6379", "premiumbagshop").unwrap();
        let store = RedisSessionStore::new(database, "sessions");
        let id = SessionId::new();

        assert_eq!(store.session_key(&id), format!("premiumbagshop:sessions:{id}"));
    }

    #[test]
    fn test_ttl_never_zero() {
        assert_eq!(RedisSessionStore::ttl_seconds(Duration::zero()), 1);
        assert_eq!(RedisSessionStore::ttl_seconds(Duration::days(14)), 1_209_600);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn test_redis_session_lifecycle() {
        let database = Database::connect("redis://127.0.0.1:6379", "storefront_test")
            .await
            .unwrap();
        let store = RedisSessionStore::new(database, "sessions");

        let mut record = SessionRecord::new();
        record.flash.push(FlashKind::Success, "stored");

        store.save(&record, Duration::days(14)).await.unwrap();
        assert!(store.exists(record.id).await.unwrap());

        let loaded = store.load(record.id).await.unwrap().unwrap();
        assert_eq!(loaded, record);

        let ttl = store.ttl(record.id).await.unwrap().unwrap();
        assert!(ttl <= Duration::days(14));
        assert!(ttl > Duration::hours(24));

        store.touch(record.id, Duration::hours(1)).await.unwrap();
        let ttl = store.ttl(record.id).await.unwrap().unwrap();
        assert!(ttl <= Duration::hours(1));

        store.destroy(record.id).await.unwrap();
        assert!(store.load(record.id).await.unwrap().is_none());
        assert!(store.ttl(record.id).await.unwrap().is_none());
    }
}
