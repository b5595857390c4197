//! Read-only financial views over the transaction ledger.
//!
//! A view is a filtered list of borrowed transactions belonging to one
//! actor. Nothing here is stored; every total is recomputed from the list.

pub mod customer;
pub mod seller;

pub use customer::CustomerView;
pub use seller::SellerView;

use mercato_common::{Transaction, TransactionKind, UserId};
use serde::Serialize;

/// One line of a detailed report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: String,
    pub label: &'static str,
    pub amount: f64,
    pub description: String,
}

/// Inclusive range check on the date prefix. Plain string comparison is
/// enough because timestamps are fixed width and zero padded. Entries
/// without a full date never match.
pub fn in_date_range(tx: &Transaction, start: &str, end: &str) -> bool {
    tx.date().is_some_and(|date| date >= start && date <= end)
}

/// Date column of a report row; undated entries show what they have.
pub(crate) fn row_date(tx: &Transaction) -> String {
    tx.date().unwrap_or(&tx.timestamp).to_string()
}

pub(crate) fn select<'a>(
    transactions: &'a [Transaction],
    actor: UserId,
    kinds: &[TransactionKind],
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.user_id == actor && kinds.contains(&tx.kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_inclusive() {
        let tx = |ts: &str| Transaction::refund(1, 1, 5.0, "", ts);

        assert!(in_date_range(&tx("2024-01-05 00:00:00"), "2024-01-05", "2024-01-06"));
        assert!(in_date_range(&tx("2024-01-06 23:59:59"), "2024-01-05", "2024-01-06"));
        assert!(!in_date_range(&tx("2024-01-07 00:00:00"), "2024-01-05", "2024-01-06"));
        assert!(!in_date_range(&tx("2024-01-04 23:59:59"), "2024-01-05", "2024-01-06"));
    }

    #[test]
    fn test_undated_entries_fall_outside_every_range() {
        let short = Transaction::refund(1, 1, 5.0, "", "2024");
        let empty = Transaction::refund(2, 1, 5.0, "", "");

        assert!(!in_date_range(&short, "", "9999-12-31"));
        assert!(!in_date_range(&empty, "", "9999-12-31"));
        assert_eq!(row_date(&short), "2024");
    }
}
