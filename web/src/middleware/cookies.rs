//! Cookie parsing stage.
//!
//! Parses every `Cookie` header once and stores the result in the request
//! extensions as [`RequestCookies`]. Later stages look cookies up by name
//! instead of re-parsing headers.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, header::COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use std::collections::HashMap;
use std::sync::Arc;

/// Cookies sent with the current request, by name.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies(Arc<HashMap<String, String>>);

impl RequestCookies {
    /// Parse the `Cookie` headers in `headers`.
    ///
    /// Malformed pairs are skipped. When a name repeats, the first value wins.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();

        for header in headers.get_all(COOKIE) {
            let Ok(header) = header.to_str() else {
                continue;
            };
            for cookie in Cookie::split_parse(header).flatten() {
                cookies
                    .entry(cookie.name().to_string())
                    .or_insert_with(|| cookie.value().to_string());
            }
        }

        Self(Arc::new(cookies))
    }

    /// Value of the cookie called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// Middleware: parse cookies into the request extensions.
pub async fn parse_cookies(mut req: Request, next: Next) -> Response {
    let cookies = RequestCookies::from_headers(req.headers());
    req.extensions_mut().insert(cookies);
    next.run(req).await
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestCookies
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .cloned()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}
