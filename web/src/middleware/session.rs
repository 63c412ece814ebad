//! Session stage.
//!
//! # Flow
//!
//! 1. **Resolve** the `connect.sid` cookie to a session (or start a new one)
//! 2. **Attach** the [`Session`](storefront_session::Session) to the request extensions
//! 3. **Run** the rest of the pipeline
//! 4. **Commit** the session and append the `Set-Cookie` header, if any
//!
//! A store failure, while loading or while saving, replaces the response
//! with the route group's fallback redirect. A request that already targets
//! the fallback page gets `503 Service Unavailable` instead.

use super::cookies::RequestCookies;
use super::route_group::RouteGroup;
use crate::error::AppError;
use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use storefront_session::{SessionManager, SessionStore};
use tower::{Layer, Service};

/// Layer attaching a session to every request.
#[derive(Debug)]
pub struct SessionLayer<S> {
    manager: Arc<SessionManager<S>>,
}

impl<S> SessionLayer<S> {
    /// Create a session layer backed by `manager`.
    #[must_use]
    pub fn new(manager: SessionManager<S>) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }
}

impl<S> Clone for SessionLayer<S> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

impl<S, I> Layer<I> for SessionLayer<S> {
    type Service = SessionMiddleware<S, I>;

    fn layer(&self, inner: I) -> Self::Service {
        SessionMiddleware {
            manager: Arc::clone(&self.manager),
            inner,
        }
    }
}

/// Middleware service for the session stage.
#[derive(Debug)]
pub struct SessionMiddleware<S, I> {
    manager: Arc<SessionManager<S>>,
    inner: I,
}

impl<S, I: Clone> Clone for SessionMiddleware<S, I> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            inner: self.inner.clone(),
        }
    }
}

impl<S, I> Service<Request> for SessionMiddleware<S, I>
where
    S: SessionStore + 'static,
    I: Service<Request, Response = Response> + Clone + Send + 'static,
    I::Future: Send + 'static,
{
    type Response = Response;
    type Error = I::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // The ready service handles this request; the clone waits for the next.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let manager = Arc::clone(&self.manager);

        Box::pin(async move {
            let group = req
                .extensions()
                .get::<RouteGroup>()
                .copied()
                .unwrap_or_else(|| RouteGroup::classify(req.uri().path()));
            let path = req.uri().path().to_owned();
            let cookie_value = session_cookie(&req, &manager.config().cookie_name);

            let session = match manager.resolve(cookie_value.as_deref()).await {
                Ok(session) => session,
                Err(error) => {
                    tracing::error!(
                        error = %error,
                        route_group = %group,
                        path = %path,
                        "Failed to load session"
                    );
                    return Ok(store_failure(group, &path, "load"));
                }
            };

            req.extensions_mut().insert(session.clone());
            let mut response = inner.call(req).await?;

            match manager.commit(&session).await {
                Ok(Some(cookie)) => match HeaderValue::from_str(&cookie.to_string()) {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                    Err(error) => {
                        tracing::error!(error = %error, "Session cookie is not a valid header value");
                    }
                },
                Ok(None) => {}
                Err(error) => {
                    tracing::error!(
                        error = %error,
                        session_id = %session.id(),
                        route_group = %group,
                        path = %path,
                        "Failed to save session, discarding response"
                    );
                    return Ok(store_failure(group, &path, "save"));
                }
            }

            Ok(response)
        })
    }
}

fn session_cookie(req: &Request, name: &str) -> Option<String> {
    match req.extensions().get::<RequestCookies>() {
        Some(cookies) => cookies.get(name).map(str::to_owned),
        None => RequestCookies::from_headers(req.headers())
            .get(name)
            .map(str::to_owned),
    }
}

/// Response for a request the session store could not serve.
///
/// Redirects to the route group's fallback page, or answers `503` when the
/// request already was for that page so a store outage cannot loop.
fn store_failure(group: RouteGroup, path: &str, stage: &'static str) -> Response {
    metrics::counter!("storefront.session.store_failures", "stage" => stage).increment(1);

    let target = group.fallback_target();
    if path == target {
        return AppError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "The shop is temporarily unavailable. Please try again shortly.".to_string(),
            "STORE_UNAVAILABLE".to_string(),
        )
        .into_response();
    }

    metrics::counter!("storefront.fallback.redirects", "route_group" => group.as_str()).increment(1);
    Redirect::to(target).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::get};
    use storefront_session::{CookieSigner, MemorySessionStore, Session, SessionConfig};
    use tower::ServiceExt;

    fn app(store: MemorySessionStore) -> Router {
        let manager = SessionManager::new(
            store,
            CookieSigner::new("test-secret").unwrap(),
            SessionConfig::default(),
        );
        Router::new()
            .route(
                "/visit",
                get(|axum::Extension(session): axum::Extension<Session>| async move {
                    let visits = session.get::<u32>("visits").unwrap_or(0) + 1;
                    session.insert("visits", visits).unwrap();
                    visits.to_string()
                }),
            )
            .route("/peek", get(|| async { "ok" }))
            .route("/shop", get(|| async { "shop" }))
            .layer(SessionLayer::new(manager))
    }

    fn cookie_pair(response: &Response) -> String {
        let header = response
            .headers()
            .get(SET_COOKIE)
            .expect("Set-Cookie should be present")
            .to_str()
            .unwrap();
        header.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_session_persists_across_requests() {
        let app = app(MemorySessionStore::new());

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/visit").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_pair(&first);

        let second = app
            .oneshot(
                Request::builder()
                    .uri("/visit")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = axum::body::to_bytes(second.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"2");
    }

    #[tokio::test]
    async fn test_untouched_existing_session_gets_no_cookie() {
        let app = app(MemorySessionStore::new());

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/peek").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_pair(&first);

        let second = app
            .oneshot(
                Request::builder()
                    .uri("/peek")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(second.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_store_down_on_load_redirects() {
        let store = MemorySessionStore::new();
        let app = app(store.clone());

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/peek").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_pair(&first);

        store.set_unavailable(true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/peek")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/shop");
    }

    #[tokio::test]
    async fn test_store_down_on_load_at_fallback_page_does_not_loop() {
        let store = MemorySessionStore::new();
        let app = app(store.clone());

        let first = app
            .clone()
            .oneshot(Request::builder().uri("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let cookie = cookie_pair(&first);

        store.set_unavailable(true);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/shop")
                    .header("cookie", &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("location").is_none());
    }

    #[tokio::test]
    async fn test_store_down_on_save_redirects_instead_of_answering() {
        let store = MemorySessionStore::new();
        store.set_unavailable(true);

        // No cookie: nothing to load, so the handler runs and only the save fails.
        let response = app(store)
            .oneshot(Request::builder().uri("/visit").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get("location").unwrap(), "/shop");
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_store_down_on_save_at_fallback_page_is_unavailable() {
        let store = MemorySessionStore::new();
        store.set_unavailable(true);

        let response = app(store)
            .oneshot(Request::builder().uri("/shop").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
