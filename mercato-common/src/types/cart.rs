use serde::Serialize;

use super::{Product, ProductId, UserId};
use crate::errors::ValidationError;

/// Upper bound on distinct lines in a cart (and on line items in an order).
pub const MAX_CART_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self { product_id, quantity }
    }
}

/// In-progress cart of one user. No two lines share a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub user_id: Option<UserId>,
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            lines: Vec::new(),
        }
    }

    pub fn with_lines(user_id: UserId, lines: Vec<CartLine>) -> Self {
        let mut cart = Self::for_user(user_id);
        for line in lines {
            cart.merge(line);
        }
        cart
    }

    fn merge(&mut self, line: CartLine) {
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    /// The merged quantity may not exceed the product's current stock.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(quantity));
        }

        let in_cart = self.quantity_of(product.id);
        let requested = in_cart.saturating_add(quantity);
        if requested > product.stock() {
            return Err(ValidationError::InsufficientStock {
                product_id: product.id,
                available: product.stock().saturating_sub(in_cart),
                requested: quantity,
            });
        }

        if in_cart == 0 && self.lines.len() >= MAX_CART_LINES {
            return Err(ValidationError::CartFull(MAX_CART_LINES));
        }

        self.merge(CartLine::new(product.id, quantity));
        Ok(())
    }

    pub fn remove(&mut self, product_id: ProductId) -> Result<(), ValidationError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(ValidationError::NotInCart(product_id));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Sum of price x quantity at current prices. Lines whose product no
    /// longer exists contribute nothing.
    pub fn total(&self, products: &[Product]) -> f64 {
        self.lines
            .iter()
            .filter_map(|line| {
                products
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .map(|p| p.price() * f64::from(line.quantity))
            })
            .sum()
    }

    /// Every line must refer to an existing product with enough stock.
    pub fn validate_stock(&self, products: &[Product]) -> Result<(), ValidationError> {
        for line in &self.lines {
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(ValidationError::ProductNotFound(line.product_id))?;
            if line.quantity > product.stock() {
                return Err(ValidationError::InsufficientStock {
                    product_id: product.id,
                    available: product.stock(),
                    requested: line.quantity,
                });
            }
        }
        Ok(())
    }
}
