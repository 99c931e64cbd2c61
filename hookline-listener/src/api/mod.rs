//! API Module
//!
//! HTTP API layer for the listener.

pub mod error;
pub mod health;
pub mod webhook;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Largest event body accepted (GitHub caps payloads at 25 MB)
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health checks
        .route("/", get(health::health_check))
        .route("/liveness", get(health::health_check))
        .route("/readiness", get(health::health_check))
        .route("/startup", get(health::health_check))
        // Event intake
        .route("/api/v1/github", post(webhook::receive_event))
        // Add state and middleware
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
