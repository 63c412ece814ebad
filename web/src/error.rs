//! Error types for the storefront.
//!
//! Two tiers:
//! - [`StartupError`]: the process cannot start (missing configuration,
//!   unusable templates, port unavailable). `main` exits non-zero.
//! - [`AppError`]: a single request failed. The response it produces is
//!   marked with a [`HandlerFailure`] extension so the fallback policy can
//!   replace it with a flash message and a redirect.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use storefront_session::SessionError;
use thiserror::Error;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// No store connection string configured.
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    /// An environment variable holds an unusable value.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name
        key: &'static str,
        /// Parse failure
        reason: String,
    },

    /// Session store or signing setup failed.
    #[error("Session setup failed: {0}")]
    Session(#[from] SessionError),

    /// Templates could not be loaded.
    #[error("Failed to load views from {path}: {reason}")]
    Views {
        /// Template directory
        path: String,
        /// Failure detail
        reason: String,
    },

    /// The listener could not be bound.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Requested address
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Application error type for request handlers.
///
/// Carries an HTTP status, a user-facing message and an optional internal
/// source that is logged but never sent to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler(ActiveSession(session): ActiveSession) -> Result<Redirect, AppError> {
///     session.insert("cart", cart).map_err(|e| AppError::internal("Cart update failed").with_source(e.into()))?;
///     Ok(Redirect::to("/shop"))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for logging and client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Marker placed in the extensions of every response built from an
/// [`AppError`].
#[derive(Debug, Clone)]
pub struct HandlerFailure(Arc<AppError>);

impl HandlerFailure {
    /// The error that produced the response.
    #[must_use]
    pub fn error(&self) -> &AppError {
        &self.0
    }

    /// Internal source, if one was attached.
    #[must_use]
    pub fn source_message(&self) -> Option<String> {
        self.0.source.as_ref().map(|e| format!("{e:#}"))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse<'a> {
    /// Error code (for client error handling).
    code: &'a str,
    /// Human-readable error message.
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Json(ErrorResponse {
            code: &self.code,
            message: &self.message,
        })
        .into_response()
        .into_body();

        let mut response = (status, body).into_response();
        response
            .extensions_mut()
            .insert(HandlerFailure(Arc::new(self)));
        response
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Session failures inside a handler are internal errors.
impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        Self::internal("Session unavailable").with_source(err.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_response_is_marked_as_failure() {
        let response = AppError::internal("boom")
            .with_source(anyhow::anyhow!("database went away"))
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let failure = response.extensions().get::<HandlerFailure>().unwrap();
        assert_eq!(failure.error().code(), "INTERNAL_SERVER_ERROR");
        assert_eq!(failure.source_message().as_deref(), Some("database went away"));
    }

    #[test]
    fn test_session_error_becomes_internal() {
        let err: AppError = SessionError::Connection("refused".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_startup_error_messages() {
        assert_eq!(
            StartupError::MissingDatabaseUrl.to_string(),
            "DATABASE_URL is not set"
        );
        let err = StartupError::InvalidValue {
            key: "PORT",
            reason: "invalid digit found in string".to_string(),
        };
        assert!(err.to_string().starts_with("Invalid value for PORT"));
    }
}
