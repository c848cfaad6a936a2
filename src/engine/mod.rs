//! Settlement and fee engines for matched lending trades.
//!
//! All engines are synchronous, deterministic integer computations. They
//! are called on the single state-transition thread, one match at a time,
//! in block order.

pub mod cancellation;
pub mod clamp;
pub mod interest;
pub mod pipeline;
pub mod settlement;

pub use cancellation::{CancellationFee, CancellationFeeEngine};
pub use clamp::{BalanceClampEngine, ClampOutcome};
pub use interest::InterestEngine;
pub use pipeline::{LendingMatchProcessor, MatchOutcome};
pub use settlement::SettlementEngine;
