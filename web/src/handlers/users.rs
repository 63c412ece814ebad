//! Account actions, mounted at `/users`.

use crate::extractors::{ActiveSession, Payload};
use crate::state::AppState;
use axum::{Router, response::Redirect, routing::post};
use serde::Deserialize;
use storefront_session::FlashKind;

/// Users route group.
pub fn routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

/// Body of `POST /users/logout`.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutForm {
    /// Page to land on afterwards. Only local paths are honoured.
    #[serde(default)]
    pub return_to: Option<String>,
}

impl LogoutForm {
    fn target(&self) -> &str {
        match self.return_to.as_deref() {
            Some(path) if is_local_path(path) => path,
            _ => "/shop",
        }
    }
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// `POST /users/logout`
#[allow(clippy::unused_async)]
pub async fn logout(
    ActiveSession(session): ActiveSession,
    Payload(form): Payload<LogoutForm>,
) -> Redirect {
    if let Some(identity) = session.identity() {
        tracing::info!(subject = %identity.subject, "Signed out");
    }
    session.sign_out();
    session.flash(FlashKind::Success, "You have been logged out");
    Redirect::to(form.target())
}
