//! Flash drain stage.
//!
//! Takes every queued flash message out of the session once per request and
//! exposes them to handlers as [`Locals`]. A message queued before a redirect
//! is therefore seen by exactly the next request.

use crate::extractors::Locals;
use axum::{extract::Request, middleware::Next, response::Response};
use storefront_session::Session;

/// Middleware: move the session's flash queue into the render locals.
pub async fn drain_flash(mut req: Request, next: Next) -> Response {
    let locals = req
        .extensions()
        .get::<Session>()
        .map(Session::take_flash)
        .unwrap_or_default();

    if !locals.is_empty() {
        tracing::debug!(messages = locals.len(), "Flash messages drained");
    }

    req.extensions_mut().insert(Locals(locals));
    next.run(req).await
}
