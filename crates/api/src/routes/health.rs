//! Health endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health report: liveness plus what this instance is wired to.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Number of expense records currently in the store.
    pub expense_records: usize,
    /// Whether an upstream Books client is configured.
    pub upstream_configured: bool,
}

/// GET `/health` - report liveness, store size, and upstream wiring.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        expense_records: state.service.record_count().await,
        upstream_configured: state.books.is_some(),
    })
}

/// Creates the health route.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
