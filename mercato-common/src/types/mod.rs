//! Persisted entity kinds and the identifiers that tie them together.

pub mod cart;
pub mod order;
pub mod product;
pub mod transaction;
pub mod user;

pub use cart::{Cart, CartLine, MAX_CART_LINES};
pub use order::{Order, OrderStatus};
pub use product::Product;
pub use transaction::{order_tag, Transaction, TransactionKind};
pub use user::{Role, User};

/// Identifiers are non-negative and unique within their own entity kind.
pub type ProductId = u32;
pub type UserId = u32;
pub type OrderId = u32;
pub type TransactionId = u32;

/// Anything that carries an identifier of its own kind.
///
/// Used by the identifier allocator to scan a loaded collection.
pub trait Identified {
    fn id(&self) -> u32;
}

impl Identified for Product {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for User {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Order {
    fn id(&self) -> u32 {
        self.id
    }
}

impl Identified for Transaction {
    fn id(&self) -> u32 {
        self.id
    }
}
