//! Vendor passthrough routes.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::routes::{upstream_error_response, upstream_not_configured};
use crate::AppState;

/// Creates the vendor routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/vendors", get(list_vendors))
}

/// GET `/vendors` - list upstream vendors.
async fn list_vendors(State(state): State<AppState>) -> Response {
    let Some(books) = &state.books else {
        return upstream_not_configured();
    };

    match books.list_vendors().await {
        Ok(vendors) => Json(json!({ "vendors": vendors })).into_response(),
        Err(e) => upstream_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use kontera_core::coa::{AccountRef, ChartOfAccounts, CoaError};
    use kontera_core::expense::ExpenseService;
    use kontera_core::store::FileExpenseStore;
    use kontera_shared::{JwtConfig, JwtService};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct StaticCoa;

    #[async_trait]
    impl ChartOfAccounts for StaticCoa {
        async fn resolve_accrued_paid_through(&self) -> Result<Option<AccountRef>, CoaError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_vendors_without_upstream_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileExpenseStore::open(dir.path().join("expenses.json")).await);
        let service = Arc::new(ExpenseService::new(store, Arc::new(StaticCoa)));
        let jwt_service = Arc::new(JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 15,
        }));
        let token = jwt_service
            .generate_access_token(Uuid::new_v4(), false, vec![])
            .unwrap();
        let app = create_router(AppState {
            service,
            jwt_service,
            books: None,
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/vendors")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
