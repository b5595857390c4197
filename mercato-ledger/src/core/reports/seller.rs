use std::collections::BTreeMap;

use mercato_common::{Transaction, TransactionKind, UserId};
use serde::Serialize;

use super::{in_date_range, row_date, select, ReportRow};

const SELLER_KINDS: [TransactionKind; 3] = [
    TransactionKind::Sale,
    TransactionKind::Expense,
    TransactionKind::Refund,
];

/// Revenue, expenses and refunds of one seller.
#[derive(Debug, Clone)]
pub struct SellerView<'a> {
    seller_id: UserId,
    entries: Vec<&'a Transaction>,
}

/// Headline numbers of a [`SellerView`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SellerSummary {
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_refunds: f64,
    pub net_profit: f64,
}

impl<'a> SellerView<'a> {
    pub fn new(seller_id: UserId, transactions: &'a [Transaction]) -> Self {
        Self {
            seller_id,
            entries: select(transactions, seller_id, &SELLER_KINDS),
        }
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn entries(&self) -> &[&'a Transaction] {
        &self.entries
    }

    fn magnitude_of(&self, keep: fn(&Transaction) -> bool) -> f64 {
        self.entries
            .iter()
            .filter(|tx| keep(tx))
            .map(|tx| tx.amount.abs())
            .sum()
    }

    pub fn total_revenue(&self) -> f64 {
        self.entries
            .iter()
            .filter(|tx| tx.is_sale())
            .map(|tx| tx.amount)
            .sum()
    }

    pub fn total_expenses(&self) -> f64 {
        self.magnitude_of(Transaction::is_expense)
    }

    pub fn total_refunds(&self) -> f64 {
        self.magnitude_of(Transaction::is_refund)
    }

    pub fn net_profit(&self) -> f64 {
        self.total_revenue() - self.total_expenses() - self.total_refunds()
    }

    pub fn summary(&self) -> SellerSummary {
        SellerSummary {
            total_revenue: self.total_revenue(),
            total_expenses: self.total_expenses(),
            total_refunds: self.total_refunds(),
            net_profit: self.net_profit(),
        }
    }

    /// Net movement per `YYYY-MM-DD`: sales add, expenses and refunds
    /// subtract their magnitude. Entries without a full date are skipped.
    pub fn daily_summary(&self) -> BTreeMap<String, f64> {
        let mut days = BTreeMap::new();
        for tx in &self.entries {
            let Some(day) = tx.date() else { continue };
            let delta = if tx.is_sale() { tx.amount } else { -tx.amount.abs() };
            *days.entry(day.to_string()).or_insert(0.0) += delta;
        }
        days
    }

    /// Entries dated between `start` and `end`, both inclusive.
    pub fn between(&self, start: &str, end: &str) -> SellerView<'a> {
        SellerView {
            seller_id: self.seller_id,
            entries: self
                .entries
                .iter()
                .copied()
                .filter(|tx| in_date_range(tx, start, end))
                .collect(),
        }
    }

    pub fn report_rows(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|tx| {
                let (label, amount) = match tx.kind {
                    TransactionKind::Sale => ("SALE", tx.amount),
                    TransactionKind::Expense => ("EXPENSE", -tx.amount.abs()),
                    _ => ("REFUND", tx.amount),
                };
                ReportRow {
                    date: row_date(tx),
                    label,
                    amount,
                    description: tx.description.clone(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Vec<Transaction> {
        vec![
            Transaction::sale(1, 2, 10, 100.0, "Order #1: Sale: Lamp x2", "2024-01-05 10:00:00"),
            Transaction::expense(2, 2, 30.0, "Shipping boxes", "2024-01-05 12:00:00"),
            Transaction::refund(3, 2, -20.0, "Refund for Order #1", "2024-01-06 09:00:00"),
            // other actors and a customer purchase of the same product
            Transaction::sale(4, 3, 10, 100.0, "Order #1: Purchase: Lamp", "2024-01-05 10:00:00"),
            Transaction::expense(5, 7, 500.0, "Rent", "2024-01-05 08:00:00"),
        ]
    }

    #[test]
    fn test_totals() {
        let ledger = ledger();
        let view = SellerView::new(2, &ledger);

        assert_eq!(view.entries().len(), 3);
        assert_eq!(
            view.summary(),
            SellerSummary {
                total_revenue: 100.0,
                total_expenses: 30.0,
                total_refunds: 20.0,
                net_profit: 50.0,
            }
        );
    }

    #[test]
    fn test_refund_sign_does_not_matter() {
        let ledger = vec![
            Transaction::refund(1, 2, 20.0, "", "2024-01-06 09:00:00"),
            Transaction::refund(2, 2, -5.0, "", "2024-01-06 09:00:00"),
        ];
        assert_eq!(SellerView::new(2, &ledger).total_refunds(), 25.0);
    }

    #[test]
    fn test_daily_summary() {
        let ledger = vec![
            Transaction::sale(1, 2, 10, 10.0, "", "2024-01-05 10:00:00"),
            Transaction::sale(2, 2, 11, 15.0, "", "2024-01-05 18:30:00"),
            Transaction::expense(3, 2, 4.0, "", "2024-01-06 08:00:00"),
            Transaction::refund(4, 2, -1.5, "", "2024-01-06 09:00:00"),
        ];
        let days = SellerView::new(2, &ledger).daily_summary();

        assert_eq!(days.len(), 2);
        assert_eq!(days["2024-01-05"], 25.0);
        assert_eq!(days["2024-01-06"], -5.5);
        assert_eq!(days.keys().next().map(String::as_str), Some("2024-01-05"));
    }

    #[test]
    fn test_daily_summary_skips_undated_entries() {
        let ledger = vec![
            Transaction::sale(1, 2, 10, 10.0, "", "2024-01-05 10:00:00"),
            Transaction::sale(2, 2, 10, 7.0, "", ""),
            Transaction::expense(3, 2, 3.0, "", "2024-01"),
        ];
        let view = SellerView::new(2, &ledger);
        let days = view.daily_summary();

        assert_eq!(days.len(), 1);
        assert_eq!(days["2024-01-05"], 10.0);
        // still part of the totals
        assert_eq!(view.total_revenue(), 17.0);
        assert_eq!(view.total_expenses(), 3.0);
    }

    #[test]
    fn test_between_narrows_totals() {
        let ledger = ledger();
        let view = SellerView::new(2, &ledger).between("2024-01-06", "2024-01-06");

        assert_eq!(view.entries().len(), 1);
        assert_eq!(view.total_revenue(), 0.0);
        assert_eq!(view.net_profit(), -20.0);
    }

    #[test]
    fn test_report_rows() {
        let ledger = ledger();
        let rows = SellerView::new(2, &ledger).report_rows();

        let labels: Vec<_> = rows.iter().map(|r| (r.label, r.amount)).collect();
        assert_eq!(labels, vec![("SALE", 100.0), ("EXPENSE", -30.0), ("REFUND", -20.0)]);
        assert_eq!(rows[0].date, "2024-01-05");
    }

    #[test]
    fn test_empty_view() {
        let view = SellerView::new(2, &[]);
        assert_eq!(view.net_profit(), 0.0);
        assert!(view.daily_summary().is_empty());
    }
}
