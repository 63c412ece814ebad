//! Last-resort handling: failed requests and unmatched paths.
//!
//! A failed request is any response built from an [`AppError`] (including a
//! panicking handler, converted by [`panic_response`]). It is replaced by a
//! `303 See Other` to the route group's fallback page, with a generic error
//! flash queued for that page. Error detail only goes to the log.

use crate::error::{AppError, HandlerFailure};
use crate::extractors::Locals;
use crate::middleware::route_group::RouteGroup;
use crate::views::Views;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use std::any::Any;
use storefront_session::{FlashKind, Session};

/// Flash shown after any failed request.
pub const FAILURE_FLASH: &str = "Something went wrong. Please try again.";

/// Middleware: turn failed responses into a flash and a redirect.
pub async fn redirect_on_failure(req: Request, next: Next) -> Response {
    let group = req
        .extensions()
        .get::<RouteGroup>()
        .copied()
        .unwrap_or_else(|| RouteGroup::classify(req.uri().path()));
    let session = req.extensions().get::<Session>().cloned();
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;

    let Some(failure) = response.extensions().get::<HandlerFailure>() else {
        return response;
    };

    let error = failure.error();
    let source = failure.source_message().unwrap_or_else(|| "none".to_string());
    tracing::error!(
        route_group = %group,
        method = %method,
        path = %path,
        status = %error.status(),
        code = error.code(),
        error = %error,
        source = %source,
        "Request failed, redirecting to {}",
        group.fallback_target()
    );

    match session {
        Some(session) => session.flash(FlashKind::Error, FAILURE_FLASH),
        None => tracing::warn!("No session attached, failure flash dropped"),
    }
    metrics::counter!("storefront.fallback.redirects", "route_group" => group.as_str()).increment(1);

    Redirect::to(group.fallback_target()).into_response()
}

/// Convert a handler panic into a failed response.
#[allow(clippy::needless_pass_by_value)]
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());

    AppError::internal("An internal error occurred")
        .with_source(anyhow::anyhow!("handler panicked: {detail}"))
        .into_response()
}

/// Not-found handler: renders the `404` view.
pub async fn not_found(State(views): State<Views>, Locals(locals): Locals, req: Request) -> Response {
    tracing::debug!(path = %req.uri().path(), "No route matched");
    metrics::counter!("storefront.not_found").increment(1);

    // Fixed placeholders: the page is rendered without looking at the session.
    let page = json!({
        "loggedin": false,
        "cartCount": 0,
        "error": "Page not found",
        "title": "Page Not Found",
    });

    match views.render_page("404", &locals, page) {
        Ok(html) => (StatusCode::NOT_FOUND, html).into_response(),
        Err(error) => {
            tracing::error!(error = %error, "Failed to render not-found page");
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::{Router, body::Body, middleware::from_fn, routing::get};
    use storefront_session::SessionRecord;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn failing() -> Result<&'static str, AppError> {
        Err(AppError::internal("boom").with_source(anyhow::anyhow!("disk on fire")))
    }

    async fn panics() -> &'static str {
        panic!("kaboom")
    }

    fn app(session: Session) -> Router {
        Router::new()
            .route("/owners/dashboard", get(failing))
            .route("/products/7", get(failing))
            .route("/shop", get(|| async { "fine" }))
            .route("/panic", get(panics))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(from_fn(redirect_on_failure))
            .layer(axum::Extension(session))
    }

    async fn get_path(app: Router, path: &str) -> Response {
        app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_owner_failure_redirects_to_owner_login() {
        let session = Session::loaded(SessionRecord::new());
        let response = get_path(app(session.clone()), "/owners/dashboard").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/owners/login");
        assert_eq!(session.take_flash().get(FlashKind::Error), [FAILURE_FLASH]);
    }

    #[tokio::test]
    async fn test_other_failure_redirects_to_shop() {
        let session = Session::loaded(SessionRecord::new());
        let response = get_path(app(session), "/products/7").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/shop");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let session = Session::loaded(SessionRecord::new());
        let response = get_path(app(session.clone()), "/shop").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(session.take_flash().is_empty());
    }

    #[tokio::test]
    async fn test_panic_is_treated_as_failure() {
        let session = Session::loaded(SessionRecord::new());
        let response = get_path(app(session.clone()), "/panic").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/shop");
        assert_eq!(session.take_flash().len(), 1);
    }

    #[tokio::test]
    async fn test_error_detail_not_sent_to_client() {
        let session = Session::loaded(SessionRecord::new());
        let response = get_path(app(session), "/owners/dashboard").await;
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        assert!(!String::from_utf8_lossy(&body).contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_not_found_renders_placeholders() {
        let views = Views::from_templates([(
            "404",
            "{{ title }}:{{ error }}:{{ 'true' if loggedin else 'false' }}:{{ cartCount }}",
        )])
        .unwrap();
        let config = crate::config::AppConfig::from_lookup(|key| {
            (key == "DATABASE_URL").then(|| "redis://localhost".to_string())
        })
        .unwrap();
        let app = Router::new()
            .fallback(not_found)
            .with_state(AppState::new(config, views));

        let response = get_path(app, "/no/such/page").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        assert_eq!(&body[..], b"Page Not Found:Page not found:false:0");
    }
}
