//! Utilities.
//!
//! Small helpers shared across Mercato: random material for credentials and
//! the wall clock used to stamp orders and ledger entries.

pub mod security;
pub mod time;
