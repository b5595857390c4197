use thiserror::Error;

use crate::types::{OrderId, ProductId, Role, UserId};

/// Rejections raised before any state is touched.
///
/// Every operation that can fail validation checks its inputs first and
/// returns one of these without mutating anything, so a caller that sees a
/// `ValidationError` can assume the in-memory and on-disk state are unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Username or password was empty at registration.
    #[error("Username and password cannot be empty")]
    EmptyCredentials,

    /// Another user already registered this username.
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    /// Username/password pair did not match any user.
    #[error("Invalid username or password")]
    InvalidLogin,

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// A stock decrement (or a cart line) asked for more units than exist.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        available: u32,
        requested: u32,
    },

    /// Quantities must be strictly positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    /// Money amounts supplied by a caller (expenses) must be strictly positive.
    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    /// Product fields failed their non-empty checks.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Cart is empty")]
    EmptyCart,

    /// The cart already holds the maximum number of distinct lines.
    #[error("Cart is full ({0} lines)")]
    CartFull(usize),

    /// Sellers may only touch their own listings.
    #[error("Product {0} belongs to another seller")]
    NotOwner(ProductId),

    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),

    /// Orders move Pending -> Refunded exactly once.
    #[error("Order {0} has already been refunded")]
    AlreadyRefunded(OrderId),

    #[error("Only {required} accounts may {action}")]
    PermissionDenied { required: Role, action: &'static str },

    #[error("No user is logged in")]
    NotLoggedIn,
}
