//! Storefront pages, mounted at `/`.

use super::PageContext;
use crate::error::AppError;
use crate::extractors::{ActiveSession, Locals};
use crate::state::AppState;
use crate::views::Views;
use axum::{Router, extract::State, response::Html, routing::get};

/// Shop route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/shop", get(shop))
}

/// `GET /`
#[allow(clippy::unused_async)]
pub async fn index(
    State(views): State<Views>,
    ActiveSession(session): ActiveSession,
    Locals(locals): Locals,
) -> Result<Html<String>, AppError> {
    views.render_page(
        "index",
        &locals,
        PageContext::for_session(&session, "Premium Bag Shop"),
    )
}

/// `GET /shop`, also the landing page after a failed request.
#[allow(clippy::unused_async)]
pub async fn shop(
    State(views): State<Views>,
    ActiveSession(session): ActiveSession,
    Locals(locals): Locals,
) -> Result<Html<String>, AppError> {
    views.render_page("shop", &locals, PageContext::for_session(&session, "Shop"))
}
