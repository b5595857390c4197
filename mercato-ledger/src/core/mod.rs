pub mod codec;
pub mod ids;
pub mod reports;
pub mod store;
