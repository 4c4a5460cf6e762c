//! Chart-of-accounts lookup collaborator interface.
//!
//! The chart of accounts is external and read-only; the core only needs
//! one canonical accessor, used to force the paid-through account of
//! accrued submissions.

use async_trait::async_trait;
use thiserror::Error;

/// Reference to a chart-of-accounts entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Account id.
    pub id: String,
    /// Account display name.
    pub name: String,
}

/// Chart-of-accounts lookup failure (transport or API level).
#[derive(Debug, Error)]
#[error("chart of accounts lookup failed: {0}")]
pub struct CoaError(pub String);

/// Read-only chart-of-accounts lookup.
#[async_trait]
pub trait ChartOfAccounts: Send + Sync {
    /// Resolves the canonical account accrued expenses are paid through.
    ///
    /// Returns `Ok(None)` when no such account exists in the chart.
    async fn resolve_accrued_paid_through(&self) -> Result<Option<AccountRef>, CoaError>;
}
