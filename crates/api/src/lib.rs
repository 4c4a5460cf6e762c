//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer-JWT authentication middleware
//! - Shared application state

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use kontera_books::BooksClient;
use kontera_core::expense::ExpenseService;
use kontera_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Expense lifecycle service.
    pub service: Arc<ExpenseService>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Upstream Books client (optional; absent when no upstream is
    /// configured, in which case upstream-dependent routes answer 503).
    pub books: Option<Arc<BooksClient>>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
