//! Storage implementations for sessions.
//!
//! - **Session Store** (Redis) - Session documents with store-native TTL

pub mod session_redis;

pub use session_redis::RedisSessionStore;
