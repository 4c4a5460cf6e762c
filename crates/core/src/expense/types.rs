//! Expense domain types.
//!
//! The record shape mirrors what the store persists; the lifecycle engine
//! is the only writer of `status`, `balance`, and `clearing_events`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Expense status in the approval lifecycle.
///
/// The valid transitions are:
/// - Pending → Approved (approve)
/// - Pending → Rejected (reject)
///
/// Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    /// Awaiting internal approval; the record can still be modified.
    Pending,
    /// Approved, optionally posted upstream; accrued records can be cleared.
    Approved,
    /// Rejected; terminal.
    Rejected,
}

impl ExpenseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the status is terminal.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an expense is paid immediately or accrued and cleared later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    /// A one-shot expense with no balance tracking.
    #[default]
    Ordinary,
    /// Recognized before payment; carries a balance paid down via
    /// clearing events.
    Accrued,
}

impl ExpenseType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ordinary => "ordinary",
            Self::Accrued => "accrued",
        }
    }
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One cash payment applied against an accrued expense's balance.
///
/// The ledger entry records the requested amount, even when it would
/// overpay the remaining balance; the balance itself is floored at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingEvent {
    /// Payment amount as requested.
    pub amount: Decimal,
    /// Cash account the payment was drawn from.
    pub paid_through_account_id: String,
    /// Display name of the cash account.
    #[serde(default)]
    pub paid_through_account_name: String,
    /// Payment date, if supplied.
    pub date: Option<NaiveDate>,
    /// External reference, if supplied.
    pub reference_number: Option<String>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Receipt metadata attached to a pending expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Original filename.
    pub filename: String,
    /// Where the file is reachable.
    pub url: String,
    /// When the receipt was attached.
    pub created_at: DateTime<Utc>,
}

/// Outcome of posting an approved expense to the upstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamOutcome {
    /// Whether the upstream accepted the expense.
    pub posted: bool,
    /// Failure message when the upstream rejected or was unreachable.
    pub error: Option<String>,
    /// Success payload, stored verbatim.
    pub response: Option<serde_json::Value>,
}

impl UpstreamOutcome {
    /// Builds a success outcome from the upstream response payload.
    #[must_use]
    pub fn success(response: serde_json::Value) -> Self {
        Self {
            posted: true,
            error: None,
            response: Some(response),
        }
    }

    /// Builds a failure outcome from an error message.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            posted: false,
            error: Some(message.into()),
            response: None,
        }
    }
}

/// A locally stored expense record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Stable identifier, assigned at creation.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: ExpenseStatus,
    /// Ordinary or accrued.
    pub expense_type: ExpenseType,
    /// Original obligation; fixed at creation.
    pub amount: Decimal,
    /// Remaining balance; `Some` only for accrued records.
    pub balance: Option<Decimal>,
    /// Expense date (used for date-range listing).
    pub date: NaiveDate,
    /// Chart-of-accounts id the expense is booked against.
    pub expense_account_id: String,
    /// Cash account the expense is (to be) paid from.
    pub paid_through_account_id: String,
    /// Display name of the paid-through account.
    #[serde(default)]
    pub paid_through_account_name: String,
    /// Upstream vendor id, if selected.
    pub vendor_id: Option<String>,
    /// Free-text vendor name.
    #[serde(default)]
    pub vendor_name: String,
    /// External reference number.
    #[serde(default)]
    pub reference_number: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Owning user; set once.
    pub created_by: Uuid,
    /// Append-only clearing ledger (accrued only).
    #[serde(default)]
    pub clearing_events: Vec<ClearingEvent>,
    /// Append-only receipt metadata.
    #[serde(default)]
    pub receipts: Vec<Receipt>,
    /// Whether the upstream accepted the expense at approval time.
    #[serde(default)]
    pub upstream_posted: bool,
    /// Upstream failure message, if posting failed.
    pub upstream_error: Option<String>,
    /// Upstream success payload, stored verbatim.
    pub upstream_response: Option<serde_json::Value>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the record was rejected.
    pub rejected_at: Option<DateTime<Utc>>,
    /// When the balance reached zero; recomputed with the balance.
    pub cleared_at: Option<DateTime<Utc>>,
}

impl ExpenseRecord {
    /// Sum of all clearing event amounts.
    #[must_use]
    pub fn cleared_total(&self) -> Decimal {
        self.clearing_events.iter().map(|e| e.amount).sum()
    }

    /// Recomputes `balance` and `cleared_at` from the authoritative
    /// identity `amount - sum(clearing_events)`, floored at zero.
    ///
    /// No-op for ordinary records.
    pub fn recompute_balance(&mut self) {
        if self.expense_type != ExpenseType::Accrued {
            return;
        }
        let remaining = (self.amount - self.cleared_total()).max(Decimal::ZERO);
        self.balance = Some(remaining);
        if remaining.is_zero() {
            if self.cleared_at.is_none() {
                self.cleared_at = Some(Utc::now());
            }
        } else {
            self.cleared_at = None;
        }
    }

    /// Returns true for an accrued record whose balance has reached zero.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        matches!(self.balance, Some(balance) if balance.is_zero())
    }
}

/// Input for creating a new expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseDraft {
    /// Ordinary or accrued.
    #[serde(default)]
    pub expense_type: ExpenseType,
    /// Upstream vendor id.
    pub vendor_id: Option<String>,
    /// Free-text vendor name.
    pub vendor_name: Option<String>,
    /// Expense date; defaults to today.
    pub date: Option<NaiveDate>,
    /// External reference number.
    pub reference_number: Option<String>,
    /// Chart-of-accounts id the expense is booked against.
    pub expense_account_id: String,
    /// Obligation amount.
    pub amount: Decimal,
    /// Cash account; ignored for accrued drafts, where the canonical
    /// accrued account is resolved from the chart of accounts.
    pub paid_through_account_id: Option<String>,
    /// Display name of the paid-through account.
    pub paid_through_account_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
}

/// Field-level changes applied to a pending expense.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensePatch {
    /// New expense date.
    pub date: Option<NaiveDate>,
    /// New vendor id.
    pub vendor_id: Option<String>,
    /// New vendor name.
    pub vendor_name: Option<String>,
    /// New reference number.
    pub reference_number: Option<String>,
    /// New expense account.
    pub expense_account_id: Option<String>,
    /// New paid-through account.
    pub paid_through_account_id: Option<String>,
    /// New paid-through account name.
    pub paid_through_account_name: Option<String>,
    /// New amount; re-seeds the balance of an accrued record.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
}

/// Input for one clearing payment against an accrued expense.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearingInput {
    /// Payment amount; must be positive.
    pub amount: Decimal,
    /// Cash account the payment is drawn from.
    pub paid_through_account_id: String,
    /// Display name of the cash account.
    pub paid_through_account_name: Option<String>,
    /// Payment date.
    pub date: Option<NaiveDate>,
    /// External reference.
    pub reference_number: Option<String>,
}
