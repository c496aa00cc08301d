//! Domain model of the checkout pipeline.
//!
//! Plain data types plus the ports ([`ports`]) through which the application
//! layer reaches carts, products, payments and the reservation ledger.

pub mod outcome;
pub mod ports;
pub mod product;
pub mod work;
