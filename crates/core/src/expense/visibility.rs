//! Pure read-time visibility filtering.
//!
//! Admin callers see everything. Non-admin callers see a record iff they
//! created it or its paid-through account is in their allow-list. The same
//! predicate backs every list endpoint and the single-record fetch.

use chrono::{Datelike, NaiveDate};
use kontera_shared::Caller;

use crate::expense::ExpenseRecord;

/// Returns whether the caller may see the record.
#[must_use]
pub fn can_view(caller: &Caller, record: &ExpenseRecord) -> bool {
    caller.is_admin
        || record.created_by == caller.user_id
        || caller
            .allowed_cash_accounts
            .contains(&record.paid_through_account_id)
}

/// Filters a list of records down to what the caller may see.
#[must_use]
pub fn filter_visible(caller: &Caller, records: Vec<ExpenseRecord>) -> Vec<ExpenseRecord> {
    if caller.is_admin {
        return records;
    }
    records
        .into_iter()
        .filter(|record| can_view(caller, record))
        .collect()
}

/// Returns the current calendar month as `[first-of-month,
/// first-of-next-month)`.
#[must_use]
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let next = if today.month() == 12 {
        NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
    }
    .unwrap_or(start);
    (start, next)
}

/// Inclusive-start / exclusive-end date range check; an absent bound
/// leaves that side open.
#[must_use]
pub fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if let Some(start) = start
        && date < start
    {
        return false;
    }
    if let Some(end) = end
        && date >= end
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{ExpenseStatus, ExpenseType};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn record(created_by: Uuid, paid_through: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: Uuid::new_v4(),
            status: ExpenseStatus::Approved,
            expense_type: ExpenseType::Ordinary,
            amount: dec!(10),
            balance: None,
            date: NaiveDate::from_ymd_opt(2026, 8, 10).unwrap(),
            expense_account_id: "E1".to_string(),
            paid_through_account_id: paid_through.to_string(),
            paid_through_account_name: String::new(),
            vendor_id: None,
            vendor_name: "Acme".to_string(),
            reference_number: String::new(),
            description: String::new(),
            created_by,
            clearing_events: Vec::new(),
            receipts: Vec::new(),
            upstream_posted: false,
            upstream_error: None,
            upstream_response: None,
            created_at: Utc::now(),
            approved_at: Some(Utc::now()),
            rejected_at: None,
            cleared_at: None,
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let caller = Caller::admin(Uuid::new_v4());
        assert!(can_view(&caller, &record(Uuid::new_v4(), "P9")));
    }

    #[test]
    fn test_owner_sees_own_record() {
        let user_id = Uuid::new_v4();
        let caller = Caller::user(user_id, Vec::<String>::new());
        assert!(can_view(&caller, &record(user_id, "P9")));
    }

    #[test]
    fn test_allowed_account_grants_visibility() {
        let caller = Caller::user(Uuid::new_v4(), ["P1"]);
        assert!(can_view(&caller, &record(Uuid::new_v4(), "P1")));
        assert!(!can_view(&caller, &record(Uuid::new_v4(), "P2")));
    }

    #[test]
    fn test_filter_visible_restricts_non_admin() {
        let user_id = Uuid::new_v4();
        let caller = Caller::user(user_id, ["P1"]);

        let records = vec![
            record(user_id, "P9"),           // visible: owned
            record(Uuid::new_v4(), "P1"),    // visible: allowed account
            record(Uuid::new_v4(), "P2"),    // hidden
        ];

        let visible = filter_visible(&caller, records);
        assert_eq!(visible.len(), 2);
        assert!(
            visible
                .iter()
                .all(|r| r.created_by == user_id || r.paid_through_account_id == "P1")
        );
    }

    #[test]
    fn test_month_bounds_mid_year() {
        let (start, end) = month_bounds(NaiveDate::from_ymd_opt(2026, 8, 26).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 9, 1).unwrap());
    }

    #[test]
    fn test_month_bounds_december_rolls_year() {
        let (start, end) = month_bounds(NaiveDate::from_ymd_opt(2026, 12, 5).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn test_in_range_is_inclusive_exclusive() {
        let start = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();

        assert!(in_range(start, Some(start), Some(end)));
        assert!(in_range(
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap(),
            Some(start),
            Some(end)
        ));
        assert!(!in_range(end, Some(start), Some(end)));
        assert!(!in_range(
            NaiveDate::from_ymd_opt(2026, 7, 31).unwrap(),
            Some(start),
            Some(end)
        ));
    }

    #[test]
    fn test_in_range_open_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        assert!(in_range(date, None, None));
        assert!(in_range(date, Some(date), None));
        assert!(!in_range(date, None, Some(date)));
    }
}
