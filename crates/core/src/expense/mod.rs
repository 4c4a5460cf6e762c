//! Pending-expense lifecycle management.
//!
//! This module implements the local bookkeeping core:
//! - Domain types for expense records and their append-only ledgers
//! - The lifecycle engine, the only component allowed to change
//!   `status`, `balance`, or the clearing ledger
//! - The pure visibility filter applied to every read

mod error;
mod service;
mod types;
pub mod visibility;

pub use error::{ExpenseError, ExpenseResult};
pub use service::ExpenseService;
pub use types::{
    ClearingEvent, ClearingInput, ExpenseDraft, ExpensePatch, ExpenseRecord, ExpenseStatus,
    ExpenseType, Receipt, UpstreamOutcome,
};
