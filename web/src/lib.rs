//! Axum request pipeline for the storefront.
//!
//! Every request (apart from `/health`) passes the same stages before a
//! route group sees it, and every failure leaves through the same exit.
//!
//! # Request Flow
//!
//! 1. **Parse** the body (JSON or form, 100 KiB max) and cookies
//! 2. **Attach** the session from the signed `connect.sid` cookie
//! 3. **Drain** flash messages into the page locals
//! 4. **Serve** a static asset if one matches
//! 5. **Dispatch** to users, shop, owners or products
//! 6. **Fall back**: a failed request becomes an error flash plus a redirect
//!    (`/owners/login` for owner pages, `/shop` otherwise); an unmatched path
//!    renders the 404 view
//!
//! # Example
//!
//! ```ignore
//! use storefront_web::{AppConfig, AppState, RouteGroups, Views, build_app};
//!
//! let config = AppConfig::from_env()?;
//! let views = Views::from_dir(&config.assets.views_dir)?;
//! let app = build_app(AppState::new(config, views), sessions, RouteGroups::default());
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod state;
pub mod views;

// Re-export key types for convenience
pub use config::AppConfig;
pub use error::{AppError, HandlerFailure, StartupError};
pub use extractors::{ActiveSession, Locals, Payload};
pub use middleware::{RouteGroup, SessionLayer};
pub use router::{RouteGroups, build_app};
pub use server::serve;
pub use state::AppState;
pub use views::Views;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
