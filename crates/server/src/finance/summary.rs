//! Aggregates over already-listed records
//!
//! Nothing here touches a store; callers pass in whatever they fetched.

use crate::finance::records::{EntryType, FinancialRecord};

/// Sum of amounts
pub fn total(records: &[FinancialRecord]) -> f64 {
    records.iter().map(|r| r.amount).sum()
}

/// Income-typed amounts minus expense-typed amounts
pub fn net_balance(records: &[FinancialRecord]) -> f64 {
    records
        .iter()
        .map(|r| match r.entry_type {
            EntryType::Income => r.amount,
            EntryType::Expense => -r.amount,
        })
        .sum()
}

/// Total income minus total expenses
pub fn total_balance(incomes: &[FinancialRecord], expenses: &[FinancialRecord]) -> f64 {
    total(incomes) - total(expenses)
}

/// Smallest and largest amount, `(0.0, 0.0)` for an empty slice
pub fn min_max(records: &[FinancialRecord]) -> (f64, f64) {
    let mut amounts = records.iter().map(|r| r.amount);
    match amounts.next() {
        None => (0.0, 0.0),
        Some(first) => amounts.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a))),
    }
}

/// The `limit` most recently created records across all given collections,
/// newest first. Ties fall back to the record date.
pub fn recent_history(collections: &[&[FinancialRecord]], limit: usize) -> Vec<FinancialRecord> {
    let mut all: Vec<&FinancialRecord> = collections.iter().flat_map(|c| c.iter()).collect();
    all.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.date.cmp(&a.date))
    });
    all.into_iter().take(limit).cloned().collect()
}
