use crate::core::amount::{self, as_decimal_str};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule set in force at a given block height.
///
/// Historical blocks must re-validate under the rules active at their
/// height, so every era keeps its own settlement function forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolEra {
    /// Blocks below the lending upgrade height.
    Legacy,
    /// Blocks at or above the lending upgrade height.
    Upgraded,
}

impl ProtocolEra {
    /// Era for `block_number` given the activation height of the upgrade.
    pub fn at_height(block_number: u64, upgrade_height: u64) -> Self {
        if block_number >= upgrade_height {
            ProtocolEra::Upgraded
        } else {
            ProtocolEra::Legacy
        }
    }
}

impl fmt::Display for ProtocolEra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolEra::Legacy => write!(f, "legacy"),
            ProtocolEra::Upgraded => write!(f, "upgraded"),
        }
    }
}

/// Network-wide protocol constants used by the fee and interest formulas.
///
/// Loaded from configuration rather than hard-coded at call sites; use
/// [`ProtocolParams::for_era`] to obtain the set that applies to a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    /// Divisor of `borrow_fee_rate` at settlement (rate is in basis points).
    #[serde(with = "as_decimal_str")]
    pub base_fee: BigUint,
    /// Anti-dust floor fee rate, in units of `base_fee`.
    #[serde(with = "as_decimal_str")]
    pub default_fee_rate: BigUint,
    /// Divisor of `borrow_fee_rate` when an order is cancelled.
    #[serde(with = "as_decimal_str")]
    pub base_cancel_fee: BigUint,
    /// Scale of APR values: `base_lending_interest` means 1% per year.
    #[serde(with = "as_decimal_str")]
    pub base_lending_interest: BigUint,
    /// Smallest relayer fee worth charging, in native smallest units.
    #[serde(with = "as_decimal_str")]
    pub minimum_relayer_lending_fee: BigUint,
    /// Decimal scale of the native currency.
    #[serde(with = "as_decimal_str")]
    pub native_decimal: BigUint,
    pub seconds_per_year: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            base_fee: BigUint::from(10_000u32),
            default_fee_rate: BigUint::from(100u32),
            base_cancel_fee: BigUint::from(100_000u32),
            base_lending_interest: BigUint::from(100_000_000u32),
            minimum_relayer_lending_fee: amount::pow10(16),
            native_decimal: amount::pow10(18),
            seconds_per_year: 365 * 24 * 60 * 60,
        }
    }
}

impl ProtocolParams {
    /// Constants in force for `era`.
    ///
    /// Both eras currently share the same values.
    pub fn for_era(era: ProtocolEra) -> Self {
        match era {
            ProtocolEra::Legacy | ProtocolEra::Upgraded => Self::default(),
        }
    }
}
