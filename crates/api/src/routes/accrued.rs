//! Accrued-expense routes: outstanding listing and clearing payments.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::routes::expense_error_response;
use crate::AppState;
use kontera_core::expense::ClearingInput;

/// Creates the accrued-expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accrued/expenses", get(list_accrued))
        .route("/accrued/{id}/clear", post(clear_accrued))
}

/// Query parameters for the accrued listing.
#[derive(Debug, Deserialize)]
pub struct AccruedQuery {
    /// Also include fully cleared records.
    #[serde(default)]
    pub include_cleared: bool,
}

/// GET `/accrued/expenses?include_cleared` - list approved accrued
/// expenses visible to the caller.
async fn list_accrued(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AccruedQuery>,
) -> Response {
    let records = state
        .service
        .list_accrued(&auth.caller(), query.include_cleared)
        .await;
    Json(records).into_response()
}

/// POST `/accrued/{id}/clear` - apply one clearing payment against an
/// approved accrued expense.
async fn clear_accrued(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ClearingInput>,
) -> Response {
    match state.service.clear(id, input, &auth.caller()).await {
        Ok(record) => {
            info!(expense_id = %id, balance = ?record.balance, "Clearing payment applied");
            Json(record).into_response()
        }
        Err(e) => expense_error_response(&e),
    }
}
