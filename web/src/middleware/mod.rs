//! Request pipeline stages.
//!
//! Stages in the order a request meets them:
//!
//! 1. [`route_group`]: tag the request with its route group
//! 2. [`cookies`]: parse cookies once
//! 3. [`session`]: load or start the session, commit it on the way out
//! 4. [`fallback::redirect_on_failure`]: replace failed responses with a flash and a redirect
//! 5. [`flash`]: drain flash messages into the render locals
//! 6. [`static_files`]: short-circuit on a matching asset
//! 7. route groups, then [`fallback::not_found`]
//!
//! See [`crate::router::build_app`] for how they are assembled.

pub mod cookies;
pub mod fallback;
pub mod flash;
pub mod route_group;
pub mod session;
pub mod static_files;

pub use cookies::{RequestCookies, parse_cookies};
pub use fallback::{FAILURE_FLASH, not_found, panic_response, redirect_on_failure};
pub use flash::drain_flash;
pub use route_group::{RouteGroup, tag_route_group};
pub use session::{SessionLayer, SessionMiddleware};
pub use static_files::{StaticFiles, serve_static};
