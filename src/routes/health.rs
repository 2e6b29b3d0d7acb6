// ABOUTME: Health check route for liveness and readiness probes
// ABOUTME: Always unauthenticated, exempted by the token extraction middleware
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Health check routes for service monitoring.

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    #[must_use]
    pub fn routes() -> axum::Router {
        use axum::{routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({ "status": "ok" }))
        }

        Router::new().route("/health", get(health_handler))
    }
}
