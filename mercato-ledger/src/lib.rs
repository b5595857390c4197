//! Persistent ledger and reporting engine of the Mercato marketplace.
//!
//! Four flat binary files (products, users, orders, transactions) plus one
//! cart snapshot per user, each rewritten atomically. The [`Marketplace`]
//! service is the single writer; [`core::reports`] derives the financial
//! views from the transaction ledger.

pub mod config;
pub mod core;
pub mod error;
pub mod market;

pub use crate::config::LedgerConfig;
pub use crate::core::codec::{Corruption, EntityKind};
pub use crate::core::reports::{CustomerView, ReportRow, SellerView};
pub use crate::core::store::EntityStore;
pub use crate::error::{CodecError, LedgerError, Result};
pub use crate::market::Marketplace;
