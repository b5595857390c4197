//! Shared domain types for the Mercato marketplace ledger.
//!
//! Everything that both the storage engine and its front ends need to agree
//! on lives here: identifiers, the four persisted entity kinds, the cart,
//! validation errors, credentials and the wall clock.

pub mod auth;
pub mod errors;
pub mod types;
pub mod utils;

pub use errors::ValidationError;
pub use types::{
    Cart, CartLine, Order, OrderId, OrderStatus, Product, ProductId, Role, Transaction,
    TransactionId, TransactionKind, User, UserId,
};
