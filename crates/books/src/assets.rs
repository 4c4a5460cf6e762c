//! Fixed-asset payload construction.
//!
//! Callers submit assets by category name; the mapping from category to
//! the four upstream account ids lives in configuration, so adding a
//! category is a config change, not a code change.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use kontera_shared::config::AssetCategoryAccounts;

/// Fixed-asset creation input as accepted from API callers.
#[derive(Debug, Clone, Deserialize)]
pub struct FixedAssetInput {
    /// Display name of the asset.
    pub asset_name: String,
    /// Configured category the asset belongs to.
    pub category: String,
    /// Purchase price.
    pub cost: Decimal,
    /// Purchase date, if known.
    pub purchase_date: Option<NaiveDate>,
    /// Free-text description.
    pub description: Option<String>,
}

/// The requested category has no configured account mapping.
#[derive(Debug, Error)]
#[error("unknown asset category: {0}")]
pub struct AssetPayloadError(pub String);

/// Builds the upstream fixed-asset creation payload, resolving the
/// category to its configured account ids.
pub fn build_asset_payload(
    input: &FixedAssetInput,
    categories: &HashMap<String, AssetCategoryAccounts>,
) -> Result<Value, AssetPayloadError> {
    let Some(accounts) = categories.get(&input.category) else {
        return Err(AssetPayloadError(input.category.clone()));
    };

    let mut payload = json!({
        "asset_name": input.asset_name,
        "fixed_asset_type_id": accounts.fixed_asset_type_id,
        "asset_account_id": accounts.asset_account_id,
        "expense_account_id": accounts.expense_account_id,
        "depreciation_account_id": accounts.depreciation_account_id,
        "purchase_price": input.cost,
    });
    if let Some(date) = input.purchase_date {
        payload["purchase_date"] = json!(date);
    }
    if let Some(description) = &input.description {
        payload["description"] = json!(description);
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn categories() -> HashMap<String, AssetCategoryAccounts> {
        HashMap::from([(
            "laptops".to_string(),
            AssetCategoryAccounts {
                fixed_asset_type_id: "t1".to_string(),
                asset_account_id: "a1".to_string(),
                expense_account_id: "e1".to_string(),
                depreciation_account_id: "d1".to_string(),
            },
        )])
    }

    #[test]
    fn test_known_category_builds_payload() {
        let input = FixedAssetInput {
            asset_name: "MacBook".to_string(),
            category: "laptops".to_string(),
            cost: dec!(2500),
            purchase_date: NaiveDate::from_ymd_opt(2026, 8, 1),
            description: None,
        };

        let payload = build_asset_payload(&input, &categories()).unwrap();
        assert_eq!(payload["asset_name"], "MacBook");
        assert_eq!(payload["fixed_asset_type_id"], "t1");
        assert_eq!(payload["depreciation_account_id"], "d1");
        assert_eq!(payload["purchase_date"], "2026-08-01");
        assert!(payload.get("description").is_none());
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let input = FixedAssetInput {
            asset_name: "Forklift".to_string(),
            category: "vehicles".to_string(),
            cost: dec!(30000),
            purchase_date: None,
            description: None,
        };

        let err = build_asset_payload(&input, &categories()).unwrap_err();
        assert_eq!(err.to_string(), "unknown asset category: vehicles");
    }
}
