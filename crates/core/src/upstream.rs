//! Upstream expense-posting collaborator interface.
//!
//! The core never talks to the accounting API directly; at approval time
//! the caller may run a poster and hand the outcome to the lifecycle
//! engine, which records it on the entity as data. A failed post is not
//! an error of the approval itself.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::expense::ExpenseRecord;

/// Expense-creation request shape the upstream API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ExpensePostRequest {
    /// Expense date.
    pub date: NaiveDate,
    /// Expense account id.
    pub account_id: String,
    /// Cash account id.
    pub paid_through_account_id: String,
    /// Expense amount.
    pub amount: Decimal,
    /// Vendor id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// External reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
}

impl From<&ExpenseRecord> for ExpensePostRequest {
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            date: record.date,
            account_id: record.expense_account_id.clone(),
            paid_through_account_id: record.paid_through_account_id.clone(),
            amount: record.amount,
            vendor_id: record.vendor_id.clone(),
            description: (!record.description.is_empty()).then(|| record.description.clone()),
            reference_number: (!record.reference_number.is_empty())
                .then(|| record.reference_number.clone()),
        }
    }
}

/// Upstream post failure, carried as a message to persist on the record.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PostError(pub String);

/// Posts approved expenses to the upstream accounting API. One attempt,
/// no retries.
#[async_trait]
pub trait ExpensePoster: Send + Sync {
    /// Creates the expense upstream and returns the response payload.
    async fn post_expense(
        &self,
        request: &ExpensePostRequest,
    ) -> Result<serde_json::Value, PostError>;
}
