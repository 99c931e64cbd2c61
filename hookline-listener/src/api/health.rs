//! Health Check API Handler
//!
//! Served on `/`, `/liveness`, `/readiness` and `/startup`. The router only
//! starts once configuration has loaded, so answering at all means ready.

use axum::{http::StatusCode, response::IntoResponse};

pub const HEALTH_MESSAGE: &str = "Listener is up and running";

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, HEALTH_MESSAGE)
}
