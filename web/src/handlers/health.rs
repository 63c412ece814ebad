//! Health check endpoint.
//!
//! Mounted ahead of the session pipeline: it answers without touching the
//! session store, so load balancers keep getting 200 while the store is down.

use crate::config::AppConfig;
use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"OK"`
    pub status: &'static str,
    /// Current time, RFC 3339
    pub timestamp: String,
    /// Deployment environment
    pub environment: String,
}

/// Liveness check.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "OK",
///   "timestamp": "2024-05-01T12:00:00.000000000+00:00",
///   "environment": "development"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check(State(config): State<Arc<AppConfig>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: config.environment.clone(),
    })
}
