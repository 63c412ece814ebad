//! In-memory provider implementations for testing.
//!
//! These mirror the production stores closely enough (including expiry) to
//! drive the whole request pipeline without a running database.

pub mod session;

pub use session::MemorySessionStore;
