//! Fixed-asset passthrough routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tracing::info;

use crate::routes::{upstream_error_response, upstream_not_configured};
use crate::AppState;
use kontera_books::{CreateAssetError, FixedAssetInput};

/// Creates the fixed-asset routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assets", post(create_asset))
        .route("/assets", get(list_assets))
        .route("/assets/{id}", get(get_asset))
}

/// POST `/assets` - create a fixed asset upstream, resolving the
/// category through the configured account mapping.
async fn create_asset(
    State(state): State<AppState>,
    Json(input): Json<FixedAssetInput>,
) -> Response {
    let Some(books) = &state.books else {
        return upstream_not_configured();
    };

    match books.create_fixed_asset(&input).await {
        Ok(response) => {
            info!(asset_name = %input.asset_name, category = %input.category, "Fixed asset created");
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(CreateAssetError::Payload(e)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "unknown_category", "message": e.to_string() })),
        )
            .into_response(),
        Err(CreateAssetError::Upstream(e)) => upstream_error_response(&e),
    }
}

/// GET `/assets` - list upstream fixed assets.
async fn list_assets(State(state): State<AppState>) -> Response {
    let Some(books) = &state.books else {
        return upstream_not_configured();
    };

    match books.list_fixed_assets().await {
        Ok(assets) => Json(json!({ "fixed_assets": assets })).into_response(),
        Err(e) => upstream_error_response(&e),
    }
}

/// GET `/assets/{id}` - fetch one upstream fixed asset.
async fn get_asset(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(books) = &state.books else {
        return upstream_not_configured();
    };

    match books.get_fixed_asset(&id).await {
        Ok(asset) => Json(json!({ "fixed_asset": asset })).into_response(),
        Err(e) => upstream_error_response(&e),
    }
}
