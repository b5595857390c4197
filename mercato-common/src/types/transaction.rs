use serde::Serialize;
use std::fmt;

use super::{OrderId, ProductId, TransactionId, UserId};

/// Economic nature of a ledger entry.
///
/// `Deposit` is a valid stored value but nothing in the marketplace
/// produces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sale,
    Refund,
    Expense,
    Deposit,
}

impl TransactionKind {
    pub fn tag(self) -> i32 {
        match self {
            TransactionKind::Sale => 0,
            TransactionKind::Refund => 1,
            TransactionKind::Expense => 2,
            TransactionKind::Deposit => 3,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            0 => Some(TransactionKind::Sale),
            1 => Some(TransactionKind::Refund),
            2 => Some(TransactionKind::Expense),
            3 => Some(TransactionKind::Deposit),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Sale => write!(f, "SALE"),
            TransactionKind::Refund => write!(f, "REFUND"),
            TransactionKind::Expense => write!(f, "EXPENSE"),
            TransactionKind::Deposit => write!(f, "DEPOSIT"),
        }
    }
}

/// One immutable ledger entry.
///
/// Sign convention: sales are positive for both the buying customer and the
/// selling seller, expenses are stored negated, customer refunds are positive
/// and seller refunds are negative. Report code only ever looks at the
/// magnitude of expenses and refunds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// The actor whose ledger this entry belongs to.
    pub user_id: UserId,
    pub product_id: Option<ProductId>,
    pub amount: f64,
    pub kind: TransactionKind,
    pub description: String,
    pub timestamp: String,
}

impl Transaction {
    pub fn new(
        id: TransactionId,
        user_id: UserId,
        product_id: Option<ProductId>,
        amount: f64,
        kind: TransactionKind,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            product_id,
            amount,
            kind,
            description: description.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn sale(
        id: TransactionId,
        actor: UserId,
        product_id: ProductId,
        amount: f64,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self::new(id, actor, Some(product_id), amount, TransactionKind::Sale, description, timestamp)
    }

    /// Expense amounts are always stored negated.
    pub fn expense(
        id: TransactionId,
        seller: UserId,
        amount: f64,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self::new(id, seller, None, -amount.abs(), TransactionKind::Expense, description, timestamp)
    }

    pub fn refund(
        id: TransactionId,
        actor: UserId,
        amount: f64,
        description: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self::new(id, actor, None, amount, TransactionKind::Refund, description, timestamp)
    }

    pub fn is_sale(&self) -> bool {
        self.kind == TransactionKind::Sale
    }

    pub fn is_refund(&self) -> bool {
        self.kind == TransactionKind::Refund
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// `YYYY-MM-DD` prefix of the timestamp, if it is long enough to have one.
    pub fn date(&self) -> Option<&str> {
        self.timestamp.get(..10)
    }

    /// `YYYY-MM` prefix of the timestamp.
    pub fn month(&self) -> Option<&str> {
        self.timestamp.get(..7)
    }

    /// True when this entry was recorded for `order_id` (see [`order_tag`]).
    pub fn belongs_to_order(&self, order_id: OrderId) -> bool {
        self.description.starts_with(&order_tag(order_id))
    }
}

/// Description prefix linking sale entries to the order that produced them.
pub fn order_tag(order_id: OrderId) -> String {
    format!("Order #{}:", order_id)
}
