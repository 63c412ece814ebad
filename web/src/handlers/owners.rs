//! Owner back office, mounted at `/owners`.

use super::PageContext;
use crate::error::AppError;
use crate::extractors::{ActiveSession, Locals};
use crate::state::AppState;
use crate::views::Views;
use axum::{Router, extract::State, response::Html, routing::get};
use storefront_session::Role;

/// Owners route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(login))
        .route("/dashboard", get(dashboard))
}

/// `GET /owners/login`, the landing page after a failed owner request.
#[allow(clippy::unused_async)]
pub async fn login(
    State(views): State<Views>,
    ActiveSession(session): ActiveSession,
    Locals(locals): Locals,
) -> Result<Html<String>, AppError> {
    views.render_page(
        "owner-login",
        &locals,
        PageContext::for_session(&session, "Owner Login"),
    )
}

/// `GET /owners/dashboard`
///
/// Requires an owner identity; anyone else fails the request and lands on
/// the owner login page.
#[allow(clippy::unused_async)]
pub async fn dashboard(
    State(views): State<Views>,
    ActiveSession(session): ActiveSession,
    Locals(locals): Locals,
) -> Result<Html<String>, AppError> {
    let owner = session
        .identity()
        .filter(|identity| identity.role == Role::Owner)
        .ok_or_else(|| AppError::unauthorized("Owner sign-in required"))?;

    tracing::debug!(owner = %owner.subject, "Rendering owner dashboard");
    views.render_page(
        "owner-dashboard",
        &locals,
        PageContext::for_session(&session, "Dashboard"),
    )
}
