//! Product management, mounted at `/products`.
//!
//! The group is mounted so its failures are tagged and redirected like the
//! others; catalog handlers plug in here.

use crate::state::AppState;
use axum::Router;

/// Products route group.
pub fn routes() -> Router<AppState> {
    Router::new()
}
