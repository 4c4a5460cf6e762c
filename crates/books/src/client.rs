//! The upstream HTTP client and its OAuth token cache.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use kontera_core::coa::{AccountRef, ChartOfAccounts, CoaError};
use kontera_core::upstream::{ExpensePostRequest, ExpensePoster, PostError};
use kontera_shared::config::UpstreamConfig;

use crate::assets::{AssetPayloadError, FixedAssetInput, build_asset_payload};
use crate::error::UpstreamError;

/// Tokens are treated as expired this long before their real expiry, so
/// a request never leaves with a token about to lapse mid-flight.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Client for the upstream Books API.
///
/// Holds the OAuth access token in an instance-owned cache and refreshes
/// it lazily from the configured refresh token. Requests are single
/// attempts; there are no retries at this layer.
pub struct BooksClient {
    http: reqwest::Client,
    config: UpstreamConfig,
    token: Mutex<Option<CachedToken>>,
}

impl BooksClient {
    /// Builds a client for the given upstream configuration.
    ///
    /// # Errors
    ///
    /// `Transport` if the underlying HTTP client cannot be constructed.
    pub fn new(config: UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            config,
            token: Mutex::new(None),
        })
    }

    /// Returns a valid access token, refreshing it if the cached one is
    /// missing or within the expiry margin.
    async fn access_token(&self) -> Result<String, UpstreamError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh(Utc::now())
        {
            return Ok(token.access_token.clone());
        }

        debug!("Refreshing upstream access token");
        let response = self
            .http
            .post(&self.config.auth_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::Auth(e.to_string()))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Auth(format!("token response: {e}")))?;

        let expires_at =
            Utc::now() + Duration::seconds(token.expires_in - TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at,
        });
        Ok(token.access_token)
    }

    /// Sends one request to the upstream and applies its response
    /// convention: a JSON body whose `code` field is zero on success.
    ///
    /// The organization id and bearer token are attached here; callers
    /// pass only the operation-specific path, query, and body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let token = self.access_token().await?;
        let url = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .query(&[("organization_id", self.config.organization_id.as_str())])
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let code = payload["code"].as_i64().unwrap_or(-1);
        if code != 0 {
            let message = payload["message"]
                .as_str()
                .unwrap_or("unknown upstream error")
                .to_string();
            warn!(url = %url, code, message = %message, "Upstream rejected request");
            return Err(UpstreamError::Api { code, message });
        }
        Ok(payload)
    }

    /// Lists upstream vendors.
    pub async fn list_vendors(&self) -> Result<Value, UpstreamError> {
        let payload = self.request(Method::GET, "vendors", &[], None).await?;
        Ok(payload["vendors"].clone())
    }

    /// Creates a fixed asset from a category-mapped input.
    ///
    /// # Errors
    ///
    /// `AssetPayloadError` for an unknown category, `UpstreamError`
    /// otherwise.
    pub async fn create_fixed_asset(
        &self,
        input: &FixedAssetInput,
    ) -> Result<Value, CreateAssetError> {
        let payload = build_asset_payload(input, &self.config.asset_categories)?;
        let response = self
            .request(Method::POST, "fixedassets", &[], Some(&payload))
            .await?;
        Ok(response)
    }

    /// Lists upstream fixed assets.
    pub async fn list_fixed_assets(&self) -> Result<Value, UpstreamError> {
        let payload = self.request(Method::GET, "fixedassets", &[], None).await?;
        Ok(payload["fixed_assets"].clone())
    }

    /// Fetches one fixed asset by upstream id.
    pub async fn get_fixed_asset(&self, asset_id: &str) -> Result<Value, UpstreamError> {
        let payload = self
            .request(Method::GET, &format!("fixedassets/{asset_id}"), &[], None)
            .await?;
        Ok(payload["fixed_asset"].clone())
    }
}

/// Failure creating a fixed asset: bad input or upstream trouble.
#[derive(Debug, thiserror::Error)]
pub enum CreateAssetError {
    /// The category is not in the configured mapping.
    #[error(transparent)]
    Payload(#[from] AssetPayloadError),
    /// The upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[async_trait]
impl ChartOfAccounts for BooksClient {
    async fn resolve_accrued_paid_through(&self) -> Result<Option<AccountRef>, CoaError> {
        let payload = self
            .request(Method::GET, "chartofaccounts", &[], None)
            .await
            .map_err(|e| CoaError(e.to_string()))?;

        let wanted = self.config.accrued_account_name.as_str();
        let account = payload["chartofaccounts"]
            .as_array()
            .into_iter()
            .flatten()
            .find(|account| account["account_name"].as_str() == Some(wanted));

        Ok(account.map(|account| AccountRef {
            id: account["account_id"].as_str().unwrap_or_default().to_string(),
            name: account["account_name"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }))
    }
}

#[async_trait]
impl ExpensePoster for BooksClient {
    async fn post_expense(&self, request: &ExpensePostRequest) -> Result<Value, PostError> {
        let body = serde_json::to_value(request).map_err(|e| PostError(e.to_string()))?;
        self.request(Method::POST, "expenses", &[], Some(&body))
            .await
            .map_err(|e| PostError(e.to_string()))
    }
}
