//! Pipeline composition.
//!
//! ```text
//! request ─► request id ─► trace ─┬─► /health
//!                                 └─► body limit ─► route group tag ─► cookies
//!                                     ─► session ─► failure redirect ─► flash drain
//!                                     ─► static files ─► panic guard
//!                                     ─► /users  /  /owners  /products ─► 404
//! ```

use crate::handlers::{self, health_check};
use crate::middleware::{
    RouteGroup, SessionLayer, StaticFiles, drain_flash, not_found, panic_response, parse_cookies,
    redirect_on_failure, serve_static, tag_route_group,
};
use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use storefront_session::{SessionManager, SessionStore};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Maximum accepted request body.
pub const BODY_LIMIT_BYTES: usize = 100 * 1024;

/// The four mounted handler sets.
#[derive(Debug)]
pub struct RouteGroups {
    /// Mounted at `/users`
    pub users: Router<AppState>,
    /// Mounted at `/`
    pub shop: Router<AppState>,
    /// Mounted at `/owners`
    pub owners: Router<AppState>,
    /// Mounted at `/products`
    pub products: Router<AppState>,
}

impl Default for RouteGroups {
    fn default() -> Self {
        Self {
            users: handlers::users::routes(),
            shop: handlers::shop::routes(),
            owners: handlers::owners::routes(),
            products: handlers::products::routes(),
        }
    }
}

/// Build the application router.
///
/// The session store is a type parameter so tests can run the full pipeline
/// against an in-memory store.
pub fn build_app<S>(state: AppState, sessions: SessionManager<S>, groups: RouteGroups) -> Router
where
    S: SessionStore + 'static,
{
    let static_files = StaticFiles::new(&state.config.assets.static_dir);

    let pipeline = Router::new()
        .nest(RouteGroup::Users.prefix(), groups.users)
        .merge(groups.shop)
        .nest(RouteGroup::Owners.prefix(), groups.owners)
        .nest(RouteGroup::Products.prefix(), groups.products)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
                .layer(from_fn(tag_route_group))
                .layer(from_fn(parse_cookies))
                .layer(SessionLayer::new(sessions))
                .layer(from_fn(redirect_on_failure))
                .layer(from_fn(drain_flash))
                .layer(from_fn_with_state(static_files, serve_static))
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .merge(pipeline)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %req.method(),
                        uri = %req.uri(),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
