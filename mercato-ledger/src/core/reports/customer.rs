use std::collections::BTreeMap;

use mercato_common::{Transaction, TransactionKind, UserId};
use serde::Serialize;

use super::{in_date_range, row_date, select, ReportRow};

const CUSTOMER_KINDS: [TransactionKind; 2] = [TransactionKind::Sale, TransactionKind::Refund];

/// Purchases and refunds of one customer.
#[derive(Debug, Clone)]
pub struct CustomerView<'a> {
    customer_id: UserId,
    entries: Vec<&'a Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub total_spent: f64,
    pub total_refunded: f64,
    pub net_spent: f64,
}

impl<'a> CustomerView<'a> {
    pub fn new(customer_id: UserId, transactions: &'a [Transaction]) -> Self {
        Self {
            customer_id,
            entries: select(transactions, customer_id, &CUSTOMER_KINDS),
        }
    }

    pub fn customer_id(&self) -> UserId {
        self.customer_id
    }

    pub fn entries(&self) -> &[&'a Transaction] {
        &self.entries
    }

    pub fn total_spent(&self) -> f64 {
        self.entries
            .iter()
            .filter(|tx| tx.is_sale())
            .map(|tx| tx.amount)
            .sum()
    }

    pub fn total_refunded(&self) -> f64 {
        self.entries
            .iter()
            .filter(|tx| tx.is_refund())
            .map(|tx| tx.amount.abs())
            .sum()
    }

    pub fn net_spent(&self) -> f64 {
        self.total_spent() - self.total_refunded()
    }

    pub fn summary(&self) -> CustomerSummary {
        CustomerSummary {
            total_spent: self.total_spent(),
            total_refunded: self.total_refunded(),
            net_spent: self.net_spent(),
        }
    }

    /// Purchases per `YYYY-MM`. Refunds and undated entries are not bucketed.
    pub fn monthly_summary(&self) -> BTreeMap<String, f64> {
        let mut months = BTreeMap::new();
        for tx in self.entries.iter().filter(|tx| tx.is_sale()) {
            if let Some(month) = tx.month() {
                *months.entry(month.to_string()).or_insert(0.0) += tx.amount;
            }
        }
        months
    }

    pub fn between(&self, start: &str, end: &str) -> CustomerView<'a> {
        CustomerView {
            customer_id: self.customer_id,
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
            .map(|tx| ReportRow {
                date: row_date(tx),
                label: if tx.is_sale() { "PURCHASE" } else { "REFUND" },
                amount: tx.amount,
                description: tx.description.clone(),
            })
            .collect()
    }
}
