//! # lending-engine
//!
//! Deterministic settlement and fee engine for an order-matched lending
//! market executed during block state transition.
//!
//! Every validating node runs this code for every matched lend/borrow
//! pair, so all arithmetic is unbounded integer arithmetic with a fixed
//! multiply-then-divide order, and rule changes are gated by
//! [`ProtocolEra`](core::params::ProtocolEra).
//!
//! ## Architecture
//!
//! - **core**: Tokens, orders, trade results, protocol constants, balance ledger
//! - **oracle**: Token decimals and epoch-snapshotted prices
//! - **engine**: Balance clamping, settlement, interest, cancellation fees
//! - **simulation**: Random trade generation for stress tests

pub mod core;
pub mod engine;
pub mod oracle;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::error::LendingError;
    pub use crate::core::ledger::BalanceLedger;
    pub use crate::core::order::{LendingOrder, Side};
    pub use crate::core::params::{ProtocolEra, ProtocolParams};
    pub use crate::core::token::{AccountId, TokenId};
    pub use crate::core::trade::{MatchedTradeContext, Role, SettlementRecord, TradeResult};
    pub use crate::engine::{
        BalanceClampEngine, CancellationFeeEngine, InterestEngine, LendingMatchProcessor,
        SettlementEngine,
    };
    pub use crate::oracle::{TokenContract, TokenPriceOracle};
}
