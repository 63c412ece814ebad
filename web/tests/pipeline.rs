//! End-to-end tests for the request pipeline, run against the in-memory
//! session store.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::{Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::path::Path;
use storefront_session::{CookieSigner, FlashKind, MemorySessionStore, SessionManager};
use storefront_web::{
    ActiveSession, AppConfig, AppError, AppState, Payload, RouteGroups, Views, build_app,
    handlers,
};
use tower::ServiceExt;

const SECRET: &str = "pipeline-test-secret";

struct Harness {
    app: Router,
    store: MemorySessionStore,
}

async fn boom() -> Result<&'static str, AppError> {
    Err(AppError::internal("boom").with_source(anyhow::anyhow!("inventory service timed out")))
}

async fn add_to_cart(ActiveSession(session): ActiveSession) -> Redirect {
    session.flash(FlashKind::Success, "Added to cart");
    Redirect::to("/shop")
}

#[derive(Deserialize)]
struct Subscription {
    email: String,
}

async fn subscribe(
    ActiveSession(session): ActiveSession,
    Payload(form): Payload<Subscription>,
) -> Redirect {
    session.flash(FlashKind::Info, format!("Subscribed {}", form.email));
    Redirect::to("/shop")
}

fn views() -> Views {
    Views::from_templates([
        ("404", "404|{{ title }}|{{ error }}|{{ 'true' if loggedin else 'false' }}|{{ cartCount }}"),
        ("index", "index"),
        (
            "shop",
            "shop|{% for m in success %}{{ m }};{% endfor %}|{% for m in error %}{{ m }};{% endfor %}|{% for m in info %}{{ m }};{% endfor %}",
        ),
        ("owner-login", "owner-login|{% for m in error %}{{ m }};{% endfor %}"),
        ("owner-dashboard", "dashboard"),
    ])
    .unwrap()
}

fn config(environment: &str) -> AppConfig {
    let static_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/public")
        .display()
        .to_string();
    let environment = environment.to_string();

    AppConfig::from_lookup(move |key| match key {
        "DATABASE_URL" => Some("redis://127.0.0.1:6379".to_string()),
        "STATIC_DIR" => Some(static_dir.clone()),
        "APP_ENV" => Some(environment.clone()),
        _ => None,
    })
    .unwrap()
}

fn harness_in(environment: &str) -> Harness {
    let config = config(environment);
    let store = MemorySessionStore::new();
    let sessions = SessionManager::new(
        store.clone(),
        CookieSigner::new(SECRET).unwrap(),
        config.session_config(),
    );

    let groups = RouteGroups {
        users: handlers::users::routes(),
        shop: handlers::shop::routes()
            .route("/cart/add", post(add_to_cart))
            .route("/subscribe", post(subscribe))
            .route("/boom", get(boom)),
        owners: handlers::owners::routes().route("/boom", get(boom)),
        products: handlers::products::routes().route("/boom", get(boom)),
    };

    Harness {
        app: build_app(AppState::new(config, views()), sessions, groups),
        store,
    }
}

fn harness() -> Harness {
    harness_in("development")
}

impl Harness {
    async fn send(&self, req: Request<Body>) -> Response {
        self.app.clone().oneshot(req).await.unwrap()
    }

    async fn get(&self, path: &str, cookie: Option<&str>) -> Response {
        self.send(request(Method::GET, path, cookie)).await
    }
}

fn request(method: Method, path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// `name=value` pair of the session cookie, ready for a `Cookie` header.
fn session_pair(response: &Response) -> String {
    let cookies = set_cookies(response);
    let cookie = cookies
        .iter()
        .find(|c| c.starts_with("connect.sid="))
        .expect("session cookie should be set");
    cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should have a location")
        .to_str()
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn first_visit_gets_exactly_one_session_cookie() {
    let harness = harness();

    let response = harness.get("/shop", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert_eq!(cookies.len(), 1);

    let cookie = &cookies[0];
    assert!(cookie.starts_with("connect.sid="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(!cookie.contains("Secure"));
    assert_eq!(harness.store.session_count(), 1);
}

#[tokio::test]
async fn production_cookie_is_secure() {
    let harness = harness_in("production");
    let response = harness.get("/shop", None).await;
    assert!(set_cookies(&response)[0].contains("Secure"));
}

#[tokio::test]
async fn returning_visitor_keeps_session_without_new_cookie() {
    let harness = harness();
    let first = harness.get("/shop", None).await;
    let cookie = session_pair(&first);

    let second = harness.get("/shop", Some(&cookie)).await;

    assert_eq!(second.status(), StatusCode::OK);
    assert!(set_cookies(&second).is_empty());
    assert_eq!(harness.store.session_count(), 1);
}

#[tokio::test]
async fn flash_is_delivered_to_the_next_request_only() {
    let harness = harness();

    // Request N: queue a flash and redirect.
    let response = harness
        .send(request(Method::POST, "/cart/add", None))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/shop");
    let cookie = session_pair(&response);

    // Request N+1 renders it.
    let next = harness.get("/shop", Some(&cookie)).await;
    assert_eq!(body_text(next).await, "shop|Added to cart;||");

    // Request N+2 does not.
    let after = harness.get("/shop", Some(&cookie)).await;
    assert_eq!(body_text(after).await, "shop|||");
}

#[tokio::test]
async fn health_answers_while_store_is_down() {
    let harness = harness();
    harness.store.set_unavailable(true);

    let response = harness.get("/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "OK");
    assert_eq!(json["environment"], "development");
    assert!(chrono::DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn unmatched_path_renders_not_found_page() {
    let harness = harness();

    let response = harness.get("/no/such/page", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_text(response).await,
        "404|Page Not Found|Page not found|false|0"
    );
}

#[tokio::test]
async fn unmatched_path_under_a_group_renders_not_found_page() {
    let harness = harness();
    let response = harness.get("/owners/nothing-here", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_failure_redirects_to_owner_login_with_flash() {
    let harness = harness();

    let response = harness.get("/owners/boom", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/owners/login");
    let cookie = session_pair(&response);

    let login = harness.get("/owners/login", Some(&cookie)).await;
    let body = body_text(login).await;
    assert_eq!(body, "owner-login|Something went wrong. Please try again.;");
    assert!(!body.contains("inventory service"));
}

#[tokio::test]
async fn other_failures_redirect_to_shop() {
    let harness = harness();

    for path in ["/boom", "/products/boom"] {
        let response = harness.get(path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/shop", "{path}");
    }
}

#[tokio::test]
async fn owner_pages_require_owner_identity() {
    let harness = harness();

    let response = harness.get("/owners/dashboard", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/owners/login");
}

#[tokio::test]
async fn tampered_cookie_is_replaced() {
    let harness = harness();
    let first = harness.get("/shop", None).await;
    let cookie = session_pair(&first);

    let (id, _signature) = cookie.rsplit_once('.').unwrap();
    let forged = format!("{id}.Zm9yZ2Vk");

    let response = harness.get("/shop", Some(&forged)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let replacement = session_pair(&response);
    assert_ne!(replacement, cookie);
    assert_eq!(harness.store.session_count(), 2);
}

#[tokio::test]
async fn static_asset_short_circuits_routing() {
    let harness = harness();

    let response = harness.get("/robots.txt", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("User-agent"));

    let head = harness.send(request(Method::HEAD, "/robots.txt", None)).await;
    assert_eq!(head.status(), StatusCode::OK);
}

#[tokio::test]
async fn store_down_on_load_redirects_by_group_then_stops() {
    let harness = harness();
    let first = harness.get("/shop", None).await;
    let cookie = session_pair(&first);

    harness.store.set_unavailable(true);

    let index = harness.get("/", Some(&cookie)).await;
    assert_eq!(index.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&index), "/shop");

    // Following the redirect must not bounce back to the same page.
    let shop = harness.get("/shop", Some(&cookie)).await;
    assert_eq!(shop.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(shop.headers().get(header::LOCATION).is_none());

    let dashboard = harness.get("/owners/dashboard", Some(&cookie)).await;
    assert_eq!(dashboard.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&dashboard), "/owners/login");

    let login = harness.get("/owners/login", Some(&cookie)).await;
    assert_eq!(login.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn store_down_on_save_discards_the_handler_response() {
    let harness = harness();
    harness.store.set_unavailable(true);

    // The handler queues a flash; it cannot be persisted, so its redirect is
    // replaced by the fallback one and no cookie is issued.
    let response = harness
        .send(request(Method::POST, "/cart/add", None))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/shop");
    assert!(set_cookies(&response).is_empty());

    let shop = harness.get("/shop", None).await;
    assert_eq!(shop.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(set_cookies(&shop).is_empty());
    assert_eq!(harness.store.session_count(), 0);
}

#[tokio::test]
async fn stored_session_outlives_cookie_but_not_store_ttl() {
    let harness = harness();
    let first = harness.get("/shop", None).await;
    let cookie = session_pair(&first);

    // Past the cookie's 24 hours the record is still there.
    harness.store.advance(chrono::Duration::hours(25));
    let later = harness.get("/shop", Some(&cookie)).await;
    assert!(set_cookies(&later).is_empty());

    // The touch above refreshed the TTL; 15 idle days later it is gone.
    harness.store.advance(chrono::Duration::days(15));
    let expired = harness.get("/shop", Some(&cookie)).await;
    assert_ne!(session_pair(&expired), cookie);
}

#[tokio::test]
async fn logout_flashes_and_redirects() {
    let harness = harness();

    let response = harness.send(logout_form("")).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/shop");
    let cookie = session_pair(&response);

    let shop = harness.get("/shop", Some(&cookie)).await;
    assert_eq!(body_text(shop).await, "shop|You have been logged out;||");
}

#[tokio::test]
async fn logout_returns_to_local_page_only() {
    let harness = harness();

    let local = harness.send(logout_form("return_to=%2Fowners%2Flogin")).await;
    assert_eq!(location(&local), "/owners/login");

    let foreign = harness.send(logout_form("return_to=https%3A%2F%2Fevil.example")).await;
    assert_eq!(location(&foreign), "/shop");
}

fn logout_form(body: &'static str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/users/logout")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn form_payload_reaches_handler() {
    let harness = harness();

    let response = harness
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/subscribe")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("email=shopper%40example.com"))
                .unwrap(),
        )
        .await;
    assert_eq!(location(&response), "/shop");
    let cookie = session_pair(&response);

    let shop = harness.get("/shop", Some(&cookie)).await;
    assert_eq!(body_text(shop).await, "shop|||Subscribed shopper@example.com;");
}

#[tokio::test]
async fn oversized_body_is_a_failed_request() {
    let harness = harness();
    let body = format!(r#"{{"email":"{}"}}"#, "a".repeat(200 * 1024));

    let response = harness
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/subscribe")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/shop");
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let harness = harness();

    let generated = harness.get("/health", None).await;
    assert!(generated.headers().contains_key("x-request-id"));

    let mut req = request(Method::GET, "/shop", None);
    req.headers_mut()
        .insert("x-request-id", "req-123".parse().unwrap());
    let echoed = harness.send(req).await;
    assert_eq!(echoed.headers().get("x-request-id").unwrap(), "req-123");
}
