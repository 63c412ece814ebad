//! Application state for Axum handlers.

use crate::config::AppConfig;
use crate::views::Views;
use axum::extract::FromRef;
use std::sync::Arc;

/// State shared by every handler and middleware stage.
///
/// The session store is not part of the state: it is owned by the session
/// stage, so handlers only ever see the request's [`storefront_session::Session`].
#[derive(Clone, Debug)]
pub struct AppState {
    /// Configuration loaded at startup
    pub config: Arc<AppConfig>,
    /// Template engine
    pub views: Views,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: AppConfig, views: Views) -> Self {
        Self {
            config: Arc::new(config),
            views,
        }
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.config)
    }
}

impl FromRef<AppState> for Views {
    fn from_ref(state: &AppState) -> Self {
        state.views.clone()
    }
}
