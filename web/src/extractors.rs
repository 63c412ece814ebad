//! Custom Axum extractors.
//!
//! - `Payload<T>`: request body as JSON or URL-encoded form, by content type
//! - `ActiveSession`: the session attached by the session stage
//! - `Locals`: flash messages drained for this request's page
//!
//! # Examples
//!
//! ```ignore
//! async fn subscribe(
//!     ActiveSession(session): ActiveSession,
//!     Payload(form): Payload<Subscription>,
//! ) -> Result<Redirect, AppError> {
//!     session.flash(FlashKind::Success, format!("Subscribed {}", form.email));
//!     Ok(Redirect::to("/shop"))
//! }
//! ```

use crate::error::AppError;
use axum::{
    Form, Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{StatusCode, header::CONTENT_TYPE, request::Parts},
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use storefront_session::{FlashMessages, Session};

/// Request body accepted as either JSON or `application/x-www-form-urlencoded`.
///
/// Body size is bounded by the pipeline's body limit; an oversized body is
/// rejected like any other malformed payload.
#[derive(Debug, Clone)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(rejection)?;
            Ok(Self(value))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(rejection)?;
            Ok(Self(value))
        } else {
            Err(AppError::new(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected a JSON or form-encoded body".to_string(),
                "UNSUPPORTED_MEDIA_TYPE".to_string(),
            ))
        }
    }
}

fn rejection(rejection: impl IntoResponse + std::fmt::Display) -> AppError {
    let message = rejection.to_string();
    let status = rejection.into_response().status();
    AppError::new(status, message, "BAD_REQUEST".to_string())
}

/// The current request's session.
///
/// Fails with an internal error if the session stage is not installed.
#[derive(Debug, Clone)]
pub struct ActiveSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for ActiveSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AppError::internal("Session unavailable"))
    }
}

/// Flash messages drained for the current request.
///
/// Empty when the flash stage did not run (e.g. `/health`).
#[derive(Debug, Clone, Default)]
pub struct Locals(pub FlashMessages);

#[async_trait]
impl<S> FromRequestParts<S> for Locals
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}
