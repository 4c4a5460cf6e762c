//! Application configuration management.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Expense store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Upstream Books API configuration (absent = upstream disabled).
    #[serde(default)]
    pub upstream: Option<UpstreamConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Expense store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path of the JSON snapshot file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/expenses.json")
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    900 // 15 minutes
}

/// Upstream Books API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the Books API, e.g. `https://books.example.com/api/v3`.
    pub base_url: String,
    /// OAuth token endpoint.
    pub auth_url: String,
    /// Organization id appended to every request.
    pub organization_id: String,
    /// OAuth client id.
    pub client_id: String,
    /// OAuth client secret.
    pub client_secret: String,
    /// Long-lived OAuth refresh token.
    pub refresh_token: String,
    /// Name of the chart-of-accounts entry used as the accrued
    /// paid-through account.
    #[serde(default = "default_accrued_account_name")]
    pub accrued_account_name: String,
    /// Fixed-asset category name to upstream account mapping.
    #[serde(default)]
    pub asset_categories: HashMap<String, AssetCategoryAccounts>,
}

fn default_accrued_account_name() -> String {
    "Accrued Expenses".to_string()
}

/// Upstream account ids backing one fixed-asset category.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetCategoryAccounts {
    /// Fixed-asset type id.
    pub fixed_asset_type_id: String,
    /// Asset account id.
    pub asset_account_id: String,
    /// Expense account id.
    pub expense_account_id: String,
    /// Accumulated-depreciation account id.
    pub depreciation_account_id: String,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KONTERA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
