use serde::Serialize;
use std::fmt;

use super::{CartLine, OrderId, UserId};
use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    Pending,
    Refunded,
}

impl OrderStatus {
    /// Stored form. Status is persisted as a string, not a tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Refunded => "Refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(OrderStatus::Pending),
            "Refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed order.
///
/// The total is computed once from the prices at checkout and then frozen;
/// later price changes never touch it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub timestamp: String,
    pub items: Vec<CartLine>,
    total: f64,
    status: OrderStatus,
}

impl Order {
    pub fn new(
        id: OrderId,
        user_id: UserId,
        timestamp: impl Into<String>,
        items: Vec<CartLine>,
        total: f64,
    ) -> Self {
        Self::from_parts(id, user_id, timestamp.into(), items, total, OrderStatus::Pending)
    }

    pub fn from_parts(
        id: OrderId,
        user_id: UserId,
        timestamp: String,
        items: Vec<CartLine>,
        total: f64,
        status: OrderStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            timestamp,
            items,
            total,
            status,
        }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_refunded(&self) -> bool {
        self.status == OrderStatus::Refunded
    }

    /// Pending -> Refunded. A second call is rejected.
    pub fn mark_refunded(&mut self) -> Result<(), ValidationError> {
        if self.is_refunded() {
            return Err(ValidationError::AlreadyRefunded(self.id));
        }
        self.status = OrderStatus::Refunded;
        Ok(())
    }
}
