//! Foundational types: tokens, orders, trade results, protocol constants
//! and the balance ledger.

pub mod amount;
pub mod error;
pub mod ledger;
pub mod order;
pub mod params;
pub mod token;
pub mod trade;
