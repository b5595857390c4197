use serde::Serialize;

use super::{ProductId, UserId};
use crate::errors::ValidationError;

/// A catalog entry owned by a seller.
///
/// `price` and `stock` are private: stock only moves through [`Product::restock`]
/// and [`Product::reduce_stock`], and neither can leave it negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    price: f64,
    pub category: String,
    stock: u32,
    pub seller_id: UserId,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: f64,
        category: impl Into<String>,
        stock: u32,
        seller_id: UserId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            category: category.into(),
            stock,
            seller_id,
        }
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Removes `quantity` units. Fails without touching stock when
    /// `quantity` is zero or larger than what is on hand.
    pub fn reduce_stock(&mut self, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(quantity));
        }
        if quantity > self.stock {
            return Err(ValidationError::InsufficientStock {
                product_id: self.id,
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    pub fn restock(&mut self, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(quantity));
        }
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or(ValidationError::InvalidQuantity(quantity))?;
        Ok(())
    }
}
