//! Token decimal scales and epoch-snapshotted prices.

pub mod price_oracle;
pub mod price_store;

pub use price_oracle::{StaticTokenRegistry, TokenContract, TokenPriceOracle};
pub use price_store::{EpochVolume, InMemoryPriceStore, PriceSnapshot, PriceStore};
