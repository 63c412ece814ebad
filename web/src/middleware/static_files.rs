//! Static asset stage.
//!
//! `GET` and `HEAD` requests are first offered to the static directory. A
//! hit ends the pipeline; a miss falls through to the route groups.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// Files served ahead of routing.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    dir: ServeDir,
}

impl StaticFiles {
    /// Serve files from `dir`.
    ///
    /// A missing directory is not an error; every lookup simply misses.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Static directory not found, serving no assets");
        }
        Self {
            dir: ServeDir::new(dir),
        }
    }

    /// Look up the asset for `probe`, if one exists.
    async fn lookup(&self, probe: Request) -> Option<Response> {
        let response = match self.dir.clone().oneshot(probe).await {
            Ok(response) => response,
            Err(never) => match never {},
        };

        (response.status() != StatusCode::NOT_FOUND).then(|| response.map(Body::new))
    }
}

/// Method, URI and headers of `req` with an empty body.
fn bodiless_copy(req: &Request) -> Request {
    let mut copy = Request::new(Body::empty());
    *copy.method_mut() = req.method().clone();
    *copy.uri_mut() = req.uri().clone();
    *copy.headers_mut() = req.headers().clone();
    copy
}

/// Middleware: answer from the static directory when an asset matches.
pub async fn serve_static(State(files): State<StaticFiles>, req: Request, next: Next) -> Response {
    let hit = if req.method() == Method::GET || req.method() == Method::HEAD {
        let probe = bodiless_copy(&req);
        files.lookup(probe).await
    } else {
        None
    };

    if let Some(response) = hit {
        tracing::debug!(path = %req.uri().path(), status = %response.status(), "Served static asset");
        return response;
    }

    next.run(req).await
}
