//! Expense lifecycle routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::routes::{expense_error_response, upstream_not_configured};
use crate::AppState;
use kontera_core::expense::{
    ExpenseDraft, ExpenseError, ExpensePatch, ExpenseStatus, UpstreamOutcome,
};
use kontera_core::upstream::{ExpensePostRequest, ExpensePoster};

/// Creates the expense routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/expenses", post(submit_expense))
        .route("/expenses/pending", get(list_pending))
        .route("/expenses/approved", get(list_approved))
        .route("/expenses/{id}", get(get_expense))
        .route("/expenses/{id}", patch(update_expense))
        .route("/expenses/{id}", delete(delete_expense))
        .route("/expenses/{id}/approve", post(approve_expense))
        .route("/expenses/{id}/reject", post(reject_expense))
        .route("/expenses/{id}/receipt", post(attach_receipt))
}

/// Query parameters for the approved listing.
#[derive(Debug, Deserialize)]
pub struct ApprovedQuery {
    /// Inclusive start date (YYYY-MM-DD).
    pub start_date: Option<NaiveDate>,
    /// Exclusive end date (YYYY-MM-DD).
    pub end_date: Option<NaiveDate>,
}

/// Request body for approving an expense.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// Whether to post the expense upstream before approving locally.
    #[serde(default)]
    pub post_upstream: bool,
}

/// Request body for attaching a receipt.
#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    /// Original filename.
    pub filename: String,
    /// Where the file is reachable.
    pub url: String,
}

/// POST `/expenses` - submit a new expense for approval.
async fn submit_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(draft): Json<ExpenseDraft>,
) -> Response {
    let caller = auth.caller();
    match state.service.submit(draft, &caller).await {
        Ok(record) => {
            info!(expense_id = %record.id, user_id = %caller.user_id, "Expense submitted");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => expense_error_response(&e),
    }
}

/// GET `/expenses/pending` - list pending expenses visible to the caller.
async fn list_pending(State(state): State<AppState>, auth: AuthUser) -> Response {
    let records = state.service.list_pending(&auth.caller()).await;
    Json(records).into_response()
}

/// GET `/expenses/approved?start_date&end_date` - list approved expenses
/// in the date range, defaulting to the current month.
async fn list_approved(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ApprovedQuery>,
) -> Response {
    let records = state
        .service
        .list_approved(&auth.caller(), query.start_date, query.end_date)
        .await;
    Json(records).into_response()
}

/// GET `/expenses/{id}` - fetch one expense.
async fn get_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state.service.get(id, &auth.caller()).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// PATCH `/expenses/{id}` - apply field-level changes to a pending expense.
async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ExpensePatch>,
) -> Response {
    match state.service.update(id, patch, &auth.caller()).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

/// DELETE `/expenses/{id}` - delete an expense.
async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state.service.delete(id, &auth.caller()).await {
        Ok(()) => {
            info!(expense_id = %id, "Expense deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => expense_error_response(&e),
    }
}

/// POST `/expenses/{id}/approve` - approve a pending expense, optionally
/// posting it upstream first.
///
/// The upstream post runs before the local transition and its outcome is
/// recorded on the record as data; a failed post still approves locally.
async fn approve_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApproveRequest>,
) -> Response {
    let caller = auth.caller();

    let outcome = if payload.post_upstream {
        let Some(books) = &state.books else {
            return upstream_not_configured();
        };
        if !caller.is_admin {
            return expense_error_response(&ExpenseError::Forbidden(
                "admin role required".to_string(),
            ));
        }
        let record = match state.service.get(id, &caller).await {
            Ok(record) => record,
            Err(e) => return expense_error_response(&e),
        };
        // Never post a record the transition below would refuse anyway.
        if record.status != ExpenseStatus::Pending {
            return expense_error_response(&ExpenseError::Conflict(format!(
                "cannot approve a {} expense",
                record.status
            )));
        }

        let request = ExpensePostRequest::from(&record);
        match books.post_expense(&request).await {
            Ok(response) => Some(UpstreamOutcome::success(response)),
            Err(e) => {
                warn!(expense_id = %id, error = %e, "Upstream expense post failed");
                Some(UpstreamOutcome::failure(e.to_string()))
            }
        }
    } else {
        None
    };

    let posted_upstream = outcome.as_ref().is_some_and(|o| o.posted);
    match state.service.approve(id, outcome, &caller).await {
        Ok(record) => {
            info!(expense_id = %id, posted = record.upstream_posted, "Expense approved");
            Json(record).into_response()
        }
        Err(e) => {
            // The upstream post and the local transition commit
            // separately; if another approval landed in between, the
            // posted outcome has no pending record left to land on.
            if posted_upstream {
                warn!(
                    expense_id = %id,
                    error = %e,
                    "Expense was posted upstream but the local approval was refused; outcome not recorded"
                );
            }
            expense_error_response(&e)
        }
    }
}

/// POST `/expenses/{id}/reject` - reject a pending expense.
async fn reject_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    match state.service.reject(id, &auth.caller()).await {
        Ok(record) => {
            info!(expense_id = %id, "Expense rejected");
            Json(record).into_response()
        }
        Err(e) => expense_error_response(&e),
    }
}

/// POST `/expenses/{id}/receipt` - attach receipt metadata to a pending
/// expense.
async fn attach_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceiptRequest>,
) -> Response {
    match state
        .service
        .attach_receipt(id, payload.filename, payload.url, &auth.caller())
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => expense_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use kontera_core::coa::{AccountRef, ChartOfAccounts, CoaError};
    use kontera_core::expense::ExpenseService;
    use kontera_core::store::FileExpenseStore;
    use kontera_shared::{JwtConfig, JwtService};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct StaticCoa;

    #[async_trait]
    impl ChartOfAccounts for StaticCoa {
        async fn resolve_accrued_paid_through(&self) -> Result<Option<AccountRef>, CoaError> {
            Ok(Some(AccountRef {
                id: "ACCRUED-1".to_string(),
                name: "Accrued Expenses".to_string(),
            }))
        }
    }

    async fn test_app() -> (axum::Router, Arc<JwtService>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileExpenseStore::open(dir.path().join("expenses.json")).await);
        let service = Arc::new(ExpenseService::new(store, Arc::new(StaticCoa)));
        let jwt_service = Arc::new(JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 15,
        }));
        let state = AppState {
            service,
            jwt_service: jwt_service.clone(),
            books: None,
        };
        (create_router(state), jwt_service, dir)
    }

    fn token(jwt: &JwtService, user_id: Uuid, is_admin: bool) -> String {
        jwt.generate_access_token(user_id, is_admin, vec![]).unwrap()
    }

    fn post_json(uri: &str, token: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_authed(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn draft_body() -> serde_json::Value {
        json!({
            "expense_account_id": "E1",
            "paid_through_account_id": "P1",
            "paid_through_account_name": "Operating Cash",
            "amount": "100",
            "vendor_name": "Acme"
        })
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let (app, _jwt, _dir) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/expenses/pending")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_submit_and_fetch_expense() {
        let (app, jwt, _dir) = test_app().await;
        let token = token(&jwt, Uuid::new_v4(), false);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &token, draft_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "pending");

        let id = created["id"].as_str().unwrap();
        let response = app
            .oneshot(get_authed(&format!("/api/v1/expenses/{id}"), &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["id"].as_str().unwrap(), id);
    }

    #[tokio::test]
    async fn test_submit_rejects_zero_amount() {
        let (app, jwt, _dir) = test_app().await;
        let token = token(&jwt, Uuid::new_v4(), false);

        let mut body = draft_body();
        body["amount"] = json!("0");
        let response = app
            .oneshot(post_json("/api/v1/expenses", &token, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_approve_then_reapprove_conflicts() {
        let (app, jwt, _dir) = test_app().await;
        let admin = token(&jwt, Uuid::new_v4(), true);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &admin, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let approve_uri = format!("/api/v1/expenses/{id}/approve");
        let response = app
            .clone()
            .oneshot(post_json(&approve_uri, &admin, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "approved");

        let response = app
            .oneshot(post_json(&approve_uri, &admin, json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_approve() {
        let (app, jwt, _dir) = test_app().await;
        let user = token(&jwt, Uuid::new_v4(), false);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &user, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(
                &format!("/api/v1/expenses/{id}/approve"),
                &user,
                json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_post_upstream_without_client_is_unavailable() {
        let (app, jwt, _dir) = test_app().await;
        let admin = token(&jwt, Uuid::new_v4(), true);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &admin, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(
                &format!("/api/v1/expenses/{id}/approve"),
                &admin,
                json!({ "post_upstream": true }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_foreign_record_is_forbidden() {
        let (app, jwt, _dir) = test_app().await;
        let owner = token(&jwt, Uuid::new_v4(), false);
        let other = token(&jwt, Uuid::new_v4(), false);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &owner, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(get_authed(&format!("/api/v1/expenses/{id}"), &other))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_owner_deletes_own_pending_expense() {
        let (app, jwt, _dir) = test_app().await;
        let user_id = Uuid::new_v4();
        let owner = token(&jwt, user_id, false);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &owner, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/v1/expenses/{id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {owner}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(get_authed(&format!("/api/v1/expenses/{id}"), &owner))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_pending_listing_hides_foreign_records() {
        let (app, jwt, _dir) = test_app().await;
        let owner = token(&jwt, Uuid::new_v4(), false);
        let other = token(&jwt, Uuid::new_v4(), false);
        let admin = token(&jwt, Uuid::new_v4(), true);

        app.clone()
            .oneshot(post_json("/api/v1/expenses", &owner, draft_body()))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(get_authed("/api/v1/expenses/pending", &other))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);

        let response = app
            .oneshot(get_authed("/api/v1/expenses/pending", &admin))
            .await
            .unwrap();
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_patch_updates_pending_expense() {
        let (app, jwt, _dir) = test_app().await;
        let admin = token(&jwt, Uuid::new_v4(), true);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &admin, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/v1/expenses/{id}"))
                    .header(header::AUTHORIZATION, format!("Bearer {admin}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "description": "Team lunch" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["description"], "Team lunch");
    }

    #[tokio::test]
    async fn test_attach_receipt_round_trip() {
        let (app, jwt, _dir) = test_app().await;
        let user = token(&jwt, Uuid::new_v4(), false);

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/expenses", &user, draft_body()))
            .await
            .unwrap();
        let id = body_json(response).await["id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(post_json(
                &format!("/api/v1/expenses/{id}/receipt"),
                &user,
                json!({ "filename": "receipt.pdf", "url": "https://files.example.com/receipt.pdf" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record = body_json(response).await;
        assert_eq!(record["receipts"][0]["filename"], "receipt.pdf");
    }
}
