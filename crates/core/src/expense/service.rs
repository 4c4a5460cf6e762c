//! Expense lifecycle engine.
//!
//! The service enforces every legal state transition and its pre/post
//! conditions. It is the only component that changes `status`, `balance`,
//! or appends to `clearing_events`; all mutations run through the store's
//! atomic `mutate`.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use kontera_shared::Caller;

use crate::coa::ChartOfAccounts;
use crate::expense::visibility;
use crate::expense::{
    ClearingEvent, ClearingInput, ExpenseDraft, ExpenseError, ExpensePatch, ExpenseRecord,
    ExpenseResult, ExpenseStatus, ExpenseType, Receipt, UpstreamOutcome,
};
use crate::store::FileExpenseStore;

/// Lifecycle engine over the expense record store.
pub struct ExpenseService {
    store: Arc<FileExpenseStore>,
    coa: Arc<dyn ChartOfAccounts>,
}

fn require_admin(actor: &Caller) -> ExpenseResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        Err(ExpenseError::Forbidden("admin role required".to_string()))
    }
}

impl ExpenseService {
    /// Creates the service over a store and a chart-of-accounts lookup.
    #[must_use]
    pub fn new(store: Arc<FileExpenseStore>, coa: Arc<dyn ChartOfAccounts>) -> Self {
        Self { store, coa }
    }

    /// Validates a draft and stores it as a new pending record.
    ///
    /// Validation fails on the first unmet rule. For accrued drafts the
    /// paid-through account is forcibly resolved from the chart of
    /// accounts; any caller-supplied value is ignored.
    pub async fn submit(&self, draft: ExpenseDraft, actor: &Caller) -> ExpenseResult<ExpenseRecord> {
        if draft.expense_account_id.trim().is_empty() {
            return Err(ExpenseError::Validation(
                "expense account is required".to_string(),
            ));
        }

        let (paid_through_id, paid_through_name) = match draft.expense_type {
            ExpenseType::Accrued => {
                let account = self
                    .coa
                    .resolve_accrued_paid_through()
                    .await
                    .map_err(|e| ExpenseError::Upstream(e.to_string()))?;
                let Some(account) = account else {
                    return Err(ExpenseError::Validation(
                        "accrued paid-through account not found in chart of accounts".to_string(),
                    ));
                };
                (account.id, account.name)
            }
            ExpenseType::Ordinary => (
                draft.paid_through_account_id.clone().unwrap_or_default(),
                draft.paid_through_account_name.clone().unwrap_or_default(),
            ),
        };

        if paid_through_id.trim().is_empty() {
            return Err(ExpenseError::Validation(
                "paid-through account is required".to_string(),
            ));
        }
        if draft.amount <= Decimal::ZERO {
            return Err(ExpenseError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        let vendor_name = draft.vendor_name.unwrap_or_default();
        if draft.vendor_id.is_none() && vendor_name.trim().is_empty() {
            return Err(ExpenseError::Validation(
                "select a vendor or enter a vendor name".to_string(),
            ));
        }

        let now = Utc::now();
        let record = ExpenseRecord {
            id: Uuid::new_v4(),
            status: ExpenseStatus::Pending,
            expense_type: draft.expense_type,
            amount: draft.amount,
            balance: (draft.expense_type == ExpenseType::Accrued).then_some(draft.amount),
            date: draft.date.unwrap_or_else(|| now.date_naive()),
            expense_account_id: draft.expense_account_id,
            paid_through_account_id: paid_through_id,
            paid_through_account_name: paid_through_name,
            vendor_id: draft.vendor_id,
            vendor_name,
            reference_number: draft.reference_number.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            created_by: actor.user_id,
            clearing_events: Vec::new(),
            receipts: Vec::new(),
            upstream_posted: false,
            upstream_error: None,
            upstream_response: None,
            created_at: now,
            approved_at: None,
            rejected_at: None,
            cleared_at: None,
        };

        self.store.put(record).await
    }

    /// Returns a single record if the caller may see it.
    ///
    /// A record the caller cannot see fails with `Forbidden`, never
    /// `NotFound` (consistent across the whole read surface).
    pub async fn get(&self, id: Uuid, caller: &Caller) -> ExpenseResult<ExpenseRecord> {
        let Some(record) = self.store.get(id).await else {
            return Err(ExpenseError::NotFound(id));
        };
        if !visibility::can_view(caller, &record) {
            return Err(ExpenseError::Forbidden("not allowed".to_string()));
        }
        Ok(record)
    }

    /// Number of records currently stored, regardless of visibility.
    pub async fn record_count(&self) -> usize {
        self.store.count().await
    }

    /// Lists pending records the caller may see, newest first.
    pub async fn list_pending(&self, caller: &Caller) -> Vec<ExpenseRecord> {
        let mut records = self
            .store
            .list(|r| r.status == ExpenseStatus::Pending)
            .await;
        records = visibility::filter_visible(caller, records);
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    /// Lists approved records the caller may see whose expense `date`
    /// falls in `[start, end)`, most recently approved first.
    ///
    /// With neither bound given the range defaults to the current
    /// calendar month.
    pub async fn list_approved(
        &self,
        caller: &Caller,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<ExpenseRecord> {
        let (start, end) = if start.is_none() && end.is_none() {
            let (first, next) = visibility::month_bounds(Utc::now().date_naive());
            (Some(first), Some(next))
        } else {
            (start, end)
        };

        let mut records = self
            .store
            .list(|r| r.status == ExpenseStatus::Approved && visibility::in_range(r.date, start, end))
            .await;
        records = visibility::filter_visible(caller, records);
        records.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
        records
    }

    /// Lists approved accrued records the caller may see, most recently
    /// approved first. Fully cleared records are skipped unless
    /// `include_cleared` is set.
    pub async fn list_accrued(&self, caller: &Caller, include_cleared: bool) -> Vec<ExpenseRecord> {
        let mut records = self
            .store
            .list(|r| {
                r.status == ExpenseStatus::Approved
                    && r.expense_type == ExpenseType::Accrued
                    && (include_cleared || !r.is_cleared())
            })
            .await;
        records = visibility::filter_visible(caller, records);
        records.sort_by(|a, b| b.approved_at.cmp(&a.approved_at));
        records
    }

    /// Transitions a pending record to approved, recording the upstream
    /// outcome when one is supplied.
    ///
    /// Approving a non-pending record is a `Conflict`.
    pub async fn approve(
        &self,
        id: Uuid,
        outcome: Option<UpstreamOutcome>,
        actor: &Caller,
    ) -> ExpenseResult<ExpenseRecord> {
        require_admin(actor)?;
        self.store
            .mutate(id, move |record| {
                if record.status != ExpenseStatus::Pending {
                    return Err(ExpenseError::Conflict(format!(
                        "cannot approve a {} expense",
                        record.status
                    )));
                }
                record.status = ExpenseStatus::Approved;
                record.approved_at = Some(Utc::now());
                if let Some(outcome) = outcome {
                    record.upstream_posted = outcome.posted;
                    record.upstream_error = outcome.error;
                    record.upstream_response = outcome.response;
                }
                Ok(())
            })
            .await
    }

    /// Transitions a pending record to rejected.
    pub async fn reject(&self, id: Uuid, actor: &Caller) -> ExpenseResult<ExpenseRecord> {
        require_admin(actor)?;
        self.store
            .mutate(id, |record| {
                if record.status != ExpenseStatus::Pending {
                    return Err(ExpenseError::Conflict(format!(
                        "cannot reject a {} expense",
                        record.status
                    )));
                }
                record.status = ExpenseStatus::Rejected;
                record.rejected_at = Some(Utc::now());
                Ok(())
            })
            .await
    }

    /// Applies field-level changes to a pending record.
    pub async fn update(
        &self,
        id: Uuid,
        patch: ExpensePatch,
        actor: &Caller,
    ) -> ExpenseResult<ExpenseRecord> {
        require_admin(actor)?;
        if let Some(amount) = patch.amount
            && amount <= Decimal::ZERO
        {
            return Err(ExpenseError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }

        self.store
            .mutate(id, move |record| {
                if record.status != ExpenseStatus::Pending {
                    return Err(ExpenseError::Conflict(
                        "only pending expenses can be updated".to_string(),
                    ));
                }

                if let Some(date) = patch.date {
                    record.date = date;
                }
                if let Some(vendor_id) = patch.vendor_id {
                    record.vendor_id = Some(vendor_id);
                }
                if let Some(vendor_name) = patch.vendor_name {
                    record.vendor_name = vendor_name;
                }
                if let Some(reference_number) = patch.reference_number {
                    record.reference_number = reference_number;
                }
                if let Some(expense_account_id) = patch.expense_account_id {
                    record.expense_account_id = expense_account_id;
                }
                if let Some(paid_through_account_id) = patch.paid_through_account_id {
                    record.paid_through_account_id = paid_through_account_id;
                }
                if let Some(paid_through_account_name) = patch.paid_through_account_name {
                    record.paid_through_account_name = paid_through_account_name;
                }
                if let Some(description) = patch.description {
                    record.description = description;
                }
                if let Some(amount) = patch.amount {
                    record.amount = amount;
                    record.recompute_balance();
                }
                Ok(())
            })
            .await
    }

    /// Deletes a record. Admins delete anything; non-admins delete only
    /// their own record while it is still pending.
    ///
    /// The authorization check runs inside the store's guarded removal,
    /// so a transition committed concurrently (an approval racing an
    /// owner's delete) is observed before the record disappears.
    pub async fn delete(&self, id: Uuid, actor: &Caller) -> ExpenseResult<()> {
        let actor = actor.clone();
        self.store
            .delete_if(id, move |record| {
                if actor.is_admin {
                    return Ok(());
                }
                if record.status != ExpenseStatus::Pending {
                    return Err(ExpenseError::Forbidden(
                        "only pending expenses can be deleted".to_string(),
                    ));
                }
                if record.created_by != actor.user_id {
                    return Err(ExpenseError::Forbidden("not your expense".to_string()));
                }
                Ok(())
            })
            .await
    }

    /// Applies one clearing payment against an approved accrued record.
    ///
    /// The ledger entry records the requested amount; the balance is then
    /// recomputed from `amount - sum(clearing_events)` and floored at
    /// zero, which keeps repeated or concurrent calls from ever driving
    /// it negative.
    pub async fn clear(
        &self,
        id: Uuid,
        input: ClearingInput,
        actor: &Caller,
    ) -> ExpenseResult<ExpenseRecord> {
        require_admin(actor)?;
        if input.amount <= Decimal::ZERO {
            return Err(ExpenseError::Validation(
                "clearing amount must be greater than zero".to_string(),
            ));
        }

        self.store
            .mutate(id, move |record| {
                if record.status != ExpenseStatus::Approved {
                    return Err(ExpenseError::Conflict(
                        "only approved expenses can be cleared".to_string(),
                    ));
                }
                if record.expense_type != ExpenseType::Accrued {
                    return Err(ExpenseError::Conflict(
                        "only accrued expenses can be cleared".to_string(),
                    ));
                }

                record.clearing_events.push(ClearingEvent {
                    amount: input.amount,
                    paid_through_account_id: input.paid_through_account_id,
                    paid_through_account_name: input.paid_through_account_name.unwrap_or_default(),
                    date: input.date,
                    reference_number: input.reference_number,
                    created_at: Utc::now(),
                });
                record.recompute_balance();
                Ok(())
            })
            .await
    }

    /// Appends receipt metadata to a pending record the caller may see.
    pub async fn attach_receipt(
        &self,
        id: Uuid,
        filename: String,
        url: String,
        actor: &Caller,
    ) -> ExpenseResult<ExpenseRecord> {
        let actor = actor.clone();
        self.store
            .mutate(id, move |record| {
                if !visibility::can_view(&actor, record) {
                    return Err(ExpenseError::Forbidden("not allowed".to_string()));
                }
                if record.status != ExpenseStatus::Pending {
                    return Err(ExpenseError::Conflict(
                        "receipts can only be attached to pending expenses".to_string(),
                    ));
                }
                record.receipts.push(Receipt {
                    filename,
                    url,
                    created_at: Utc::now(),
                });
                Ok(())
            })
            .await
    }
}
