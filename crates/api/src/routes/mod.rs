//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{AppState, middleware::auth::auth_middleware};
use kontera_core::expense::ExpenseError;

pub mod accrued;
pub mod assets;
pub mod expenses;
pub mod health;
pub mod vendors;

/// Creates the API router: health is public, everything else sits behind
/// the bearer-JWT middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(expenses::routes())
        .merge(accrued::routes())
        .merge(vendors::routes())
        .merge(assets::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Maps a lifecycle error to its HTTP response.
pub(crate) fn expense_error_response(e: &ExpenseError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": e.error_code(), "message": e.to_string() })),
    )
        .into_response()
}

/// Maps an upstream client error to its HTTP response.
pub(crate) fn upstream_error_response(e: &kontera_books::UpstreamError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({ "error": e.error_code(), "message": e.to_string() })),
    )
        .into_response()
}

/// Standard 503 for routes that need an upstream no one configured.
pub(crate) fn upstream_not_configured() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "upstream_not_configured",
            "message": "Upstream Books API is not configured"
        })),
    )
        .into_response()
}
