//! Route group tagging.
//!
//! Every request is tagged once, on the way in, with the route group its
//! path belongs to. The fallback policy reads the tag instead of inspecting
//! paths at the failure site.

use axum::{extract::Request, middleware::Next, response::Response};
use std::fmt;

/// One of the mounted handler sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteGroup {
    /// Account actions, mounted at `/users`
    Users,
    /// Storefront pages, mounted at `/`
    Shop,
    /// Owner back office, mounted at `/owners`
    Owners,
    /// Product management, mounted at `/products`
    Products,
}

impl RouteGroup {
    /// Groups in mount order.
    pub const MOUNT_ORDER: [Self; 4] = [Self::Users, Self::Shop, Self::Owners, Self::Products];

    /// Mount prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Users => "/users",
            Self::Shop => "/",
            Self::Owners => "/owners",
            Self::Products => "/products",
        }
    }

    /// Group that serves `path`.
    ///
    /// Prefixes match whole segments (`/ownersfoo` is not under `/owners`);
    /// anything outside the nested groups belongs to the shop.
    #[must_use]
    pub fn classify(path: &str) -> Self {
        Self::MOUNT_ORDER
            .into_iter()
            .filter(|group| *group != Self::Shop)
            .find(|group| under_prefix(path, group.prefix()))
            .unwrap_or(Self::Shop)
    }

    /// Where a failed request in this group is redirected.
    #[must_use]
    pub const fn fallback_target(self) -> &'static str {
        match self {
            Self::Owners => "/owners/login",
            Self::Users | Self::Shop | Self::Products => "/shop",
        }
    }

    /// Lowercase name, for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Shop => "shop",
            Self::Owners => "owners",
            Self::Products => "products",
        }
    }
}

impl fmt::Display for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Middleware: tag the request with its [`RouteGroup`].
pub async fn tag_route_group(mut req: Request, next: Next) -> Response {
    let group = RouteGroup::classify(req.uri().path());
    req.extensions_mut().insert(group);
    next.run(req).await
}
