//! Kontera API Server
//!
//! Main entry point for the Kontera backend service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kontera_api::{AppState, create_router};
use kontera_books::BooksClient;
use kontera_core::expense::ExpenseService;
use kontera_core::store::FileExpenseStore;
use kontera_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kontera=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Failed to load config: {e}"))?;

    // Open the expense record store
    let store = Arc::new(FileExpenseStore::open(config.store.path.clone()).await);
    info!(path = %config.store.path.display(), "Expense store opened");

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        #[allow(clippy::cast_possible_wrap)]
        access_token_expires_minutes: (config.jwt.access_token_expiry_secs / 60) as i64,
    };
    let jwt_service = JwtService::new(jwt_config);

    // Wire the upstream Books client when configured
    let books = match &config.upstream {
        Some(upstream) => {
            let client = BooksClient::new(upstream.clone())
                .map_err(|e| anyhow::anyhow!("Failed to build upstream client: {e}"))?;
            info!(base_url = %upstream.base_url, "Upstream Books client configured");
            Some(Arc::new(client))
        }
        None => {
            info!("No upstream configured; upstream-dependent routes will answer 503");
            None
        }
    };

    // The lifecycle engine resolves the accrued paid-through account
    // through the Books client; without an upstream, accrued submissions
    // are rejected at validation time.
    let coa: Arc<dyn kontera_core::coa::ChartOfAccounts> = match &books {
        Some(client) => client.clone(),
        None => Arc::new(NoChartOfAccounts),
    };
    let service = Arc::new(ExpenseService::new(store, coa));

    // Create application state
    let state = AppState {
        service,
        jwt_service: Arc::new(jwt_service),
        books,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Chart-of-accounts stand-in for deployments without an upstream.
struct NoChartOfAccounts;

#[async_trait::async_trait]
impl kontera_core::coa::ChartOfAccounts for NoChartOfAccounts {
    async fn resolve_accrued_paid_through(
        &self,
    ) -> Result<Option<kontera_core::coa::AccountRef>, kontera_core::coa::CoaError> {
        Ok(None)
    }
}
