//! Session store trait.

use crate::error::Result;
use crate::state::{SessionId, SessionRecord};
use chrono::Duration;

/// Session store.
///
/// This trait abstracts over session storage so the request pipeline can run
/// against Redis in production and an in-memory map in tests.
///
/// # Implementation Notes
///
/// - Expiry is store-native: a record saved or touched with `ttl` must be
///   unreachable once `ttl` has elapsed without another save or touch
/// - No application-level sweep
/// - Concurrent writers on one session are last-write-wins
pub trait SessionStore: Send + Sync {
    /// Load a session record.
    ///
    /// # Returns
    ///
    /// `None` if the record does not exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The store cannot be reached
    /// - The stored document cannot be decoded
    fn load(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<Option<SessionRecord>>> + Send;

    /// Insert or replace a session record and reset its time-to-live.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn save(
        &self,
        record: &SessionRecord,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Reset the time-to-live of an unmodified record.
    ///
    /// Touching a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn touch(
        &self,
        session_id: SessionId,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Delete a session record.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn destroy(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Check if a live record exists.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn exists(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    /// Remaining time-to-live for a record.
    ///
    /// # Returns
    ///
    /// `None` if the record doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be reached.
    fn ttl(
        &self,
        session_id: SessionId,
    ) -> impl std::future::Future<Output = Result<Option<Duration>>> + Send;
}
