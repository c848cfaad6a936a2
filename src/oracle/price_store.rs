use crate::core::amount::{as_decimal_str, opt_as_decimal_str};
use crate::core::token::{PairKey, TokenId};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Volume traded on a pair since the current epoch opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochVolume {
    /// Σ price · quantity
    #[serde(with = "as_decimal_str")]
    pub value: BigUint,
    /// Σ quantity
    #[serde(with = "as_decimal_str")]
    pub quantity: BigUint,
}

impl EpochVolume {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Volume-weighted average price, `None` without volume.
    pub fn average_price(&self) -> Option<BigUint> {
        if self.is_empty() {
            None
        } else {
            Some(&self.value / &self.quantity)
        }
    }
}

/// Prices recorded for one ordered token pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Price of the latest trade; informational only.
    #[serde(with = "opt_as_decimal_str", default)]
    pub last_price: Option<BigUint>,
    /// Price frozen when the current epoch opened. Fees read only this.
    #[serde(with = "opt_as_decimal_str", default)]
    pub epoch_price: Option<BigUint>,
    #[serde(default)]
    pub volume: EpochVolume,
}

/// Storage behind the price oracle.
///
/// Production nodes back this with the state trie; tests use
/// [`InMemoryPriceStore`] so each test owns an isolated cache.
pub trait PriceStore {
    /// Cached `10^decimals` of `token`.
    fn decimal(&self, token: &TokenId) -> Option<BigUint>;

    fn set_decimal(&mut self, token: TokenId, scale: BigUint);

    fn snapshot(&self, pair: &PairKey) -> Option<&PriceSnapshot>;

    /// Mutable snapshot, created empty on first access.
    fn snapshot_mut(&mut self, pair: PairKey) -> &mut PriceSnapshot;

    /// All pairs with a snapshot, in key order.
    fn pairs(&self) -> Vec<PairKey>;

    /// Drop every cached decimal and price. Bootstrap/test hook only.
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceStore {
    decimals: HashMap<TokenId, BigUint>,
    snapshots: BTreeMap<PairKey, PriceSnapshot>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PriceStore for InMemoryPriceStore {
    fn decimal(&self, token: &TokenId) -> Option<BigUint> {
        self.decimals.get(token).cloned()
    }

    fn set_decimal(&mut self, token: TokenId, scale: BigUint) {
        self.decimals.insert(token, scale);
    }

    fn snapshot(&self, pair: &PairKey) -> Option<&PriceSnapshot> {
        self.snapshots.get(pair)
    }

    fn snapshot_mut(&mut self, pair: PairKey) -> &mut PriceSnapshot {
        self.snapshots.entry(pair).or_default()
    }

    fn pairs(&self) -> Vec<PairKey> {
        self.snapshots.keys().copied().collect()
    }

    fn clear(&mut self) {
        self.decimals.clear();
        self.snapshots.clear();
    }
}
