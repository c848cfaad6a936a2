use crate::core::amount;
use crate::core::error::{ContractError, LendingError};
use crate::core::token::{PairKey, TokenId};
use crate::oracle::price_store::{InMemoryPriceStore, PriceStore};
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashMap;

/// Read-only access to token contracts.
///
/// Implementations wrap the contract call in their own timeout; an error
/// is final for this query and is never retried here.
pub trait TokenContract {
    /// Value returned by the token's `decimals()` method.
    fn decimals(&self, token: &TokenId) -> Result<u32, ContractError>;
}

/// Fixed table of token decimals, for tests and offline tooling.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenRegistry {
    decimals: HashMap<TokenId, u32>,
}

impl StaticTokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: TokenId, decimals: u32) -> Self {
        self.decimals.insert(token, decimals);
        self
    }
}

impl TokenContract for StaticTokenRegistry {
    fn decimals(&self, token: &TokenId) -> Result<u32, ContractError> {
        self.decimals
            .get(token)
            .copied()
            .ok_or(ContractError::NoContract(*token))
    }
}

/// Per-token decimal scales and epoch-opening prices.
///
/// Fee and threshold computations must read [`epoch_price`] (frozen for
/// the epoch) and never the live [`last_price`].
///
/// [`epoch_price`]: TokenPriceOracle::epoch_price
/// [`last_price`]: TokenPriceOracle::last_price
///
/// # Examples
///
/// ```
/// use lending_engine::core::token::TokenId;
/// use lending_engine::oracle::{StaticTokenRegistry, TokenPriceOracle};
/// use num_bigint::BigUint;
///
/// let usdt = TokenId::from_bytes([0xaa; 20]);
/// let registry = StaticTokenRegistry::new().with_token(usdt, 6);
/// let mut oracle = TokenPriceOracle::new(Box::new(registry), BigUint::from(10u32).pow(18));
///
/// assert_eq!(oracle.decimals_of(&usdt).unwrap(), BigUint::from(1_000_000u32));
/// assert_eq!(oracle.epoch_price(&usdt, &TokenId::NATIVE), None);
/// ```
pub struct TokenPriceOracle<S: PriceStore = InMemoryPriceStore> {
    store: S,
    contract: Box<dyn TokenContract>,
    native_decimal: BigUint,
}

impl TokenPriceOracle<InMemoryPriceStore> {
    pub fn new(contract: Box<dyn TokenContract>, native_decimal: BigUint) -> Self {
        Self::with_store(InMemoryPriceStore::new(), contract, native_decimal)
    }
}

impl<S: PriceStore> TokenPriceOracle<S> {
    pub fn with_store(store: S, contract: Box<dyn TokenContract>, native_decimal: BigUint) -> Self {
        Self {
            store,
            contract,
            native_decimal,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `10^decimals` of `token`, memoized after the first successful query.
    ///
    /// The native currency is a fixed constant and is never queried.
    pub fn decimals_of(&mut self, token: &TokenId) -> Result<BigUint, LendingError> {
        if token.is_native() {
            return Ok(self.native_decimal.clone());
        }
        if let Some(scale) = self.store.decimal(token) {
            return Ok(scale);
        }
        let decimals = self.contract.decimals(token).map_err(|e| {
            log::warn!("decimals() query failed: {}", e);
            LendingError::PriceUnavailable { token: *token }
        })?;
        let scale = amount::pow10(decimals);
        log::debug!("cached decimals of {}: {}", token, decimals);
        self.store.set_decimal(*token, scale.clone());
        Ok(scale)
    }

    /// Epoch-opening price of `base` in `quote`; `None` if never recorded.
    pub fn epoch_price(&self, base: &TokenId, quote: &TokenId) -> Option<BigUint> {
        self.store
            .snapshot(&PairKey::new(base, quote))
            .and_then(|s| s.epoch_price.clone())
    }

    /// Overwrite the frozen epoch price of `base` in `quote`.
    pub fn record_epoch_open(&mut self, base: &TokenId, quote: &TokenId, price: BigUint) {
        log::debug!("epoch price {}/{} = {}", base, quote, price);
        self.store
            .snapshot_mut(PairKey::new(base, quote))
            .epoch_price = Some(price);
    }

    /// Price of the most recent trade of `base` in `quote`.
    pub fn last_price(&self, base: &TokenId, quote: &TokenId) -> Option<BigUint> {
        self.store
            .snapshot(&PairKey::new(base, quote))
            .and_then(|s| s.last_price.clone())
    }

    /// Record a trade: updates the live price and the current epoch's
    /// volume. The epoch price is untouched until [`roll_epoch`].
    ///
    /// [`roll_epoch`]: TokenPriceOracle::roll_epoch
    pub fn record_trade(
        &mut self,
        base: &TokenId,
        quote: &TokenId,
        price: BigUint,
        quantity: &BigUint,
    ) {
        let snapshot = self.store.snapshot_mut(PairKey::new(base, quote));
        snapshot.volume.value += &price * quantity;
        snapshot.volume.quantity += quantity;
        snapshot.last_price = Some(price);
    }

    /// Open a new epoch: every pair traded during the closing epoch gets
    /// its volume-weighted average price as the new epoch price.
    ///
    /// Returns the number of pairs whose snapshot changed.
    pub fn roll_epoch(&mut self) -> usize {
        let mut rolled = 0;
        for pair in self.store.pairs() {
            let snapshot = self.store.snapshot_mut(pair);
            if let Some(average) = snapshot.volume.average_price() {
                snapshot.epoch_price = Some(average);
                rolled += 1;
            }
            snapshot.volume = Default::default();
        }
        log::debug!("epoch rolled, {} pairs repriced", rolled);
        rolled
    }

    /// Price of one whole `token` in native smallest units.
    pub fn native_price(&self, token: &TokenId) -> Option<BigUint> {
        if token.is_native() {
            return Some(self.native_decimal.clone());
        }
        self.epoch_price(token, &TokenId::NATIVE)
            .filter(|p| !p.is_zero())
    }

    /// Value of `amount` smallest units of `token` in native smallest units.
    ///
    /// `None` when no price path exists; that includes a token whose
    /// decimals cannot be read.
    pub fn native_value(&mut self, token: &TokenId, amount: &BigUint) -> Option<BigUint> {
        if token.is_native() {
            return Some(amount.clone());
        }
        let price = self.native_price(token)?;
        let decimal = self.decimals_of(token).ok()?;
        Some(amount * price / decimal)
    }

    /// Price of one whole `collateral` token in `lending` smallest units.
    ///
    /// Uses the direct pair when it has an epoch price, otherwise crosses
    /// both tokens through the native currency.
    pub fn collateral_price(
        &mut self,
        collateral: &TokenId,
        lending: &TokenId,
    ) -> Result<BigUint, LendingError> {
        if let Some(direct) = self
            .epoch_price(collateral, lending)
            .filter(|p| !p.is_zero())
        {
            return Ok(direct);
        }
        let collateral_native = self
            .native_price(collateral)
            .ok_or(LendingError::PriceUnavailable { token: *collateral })?;
        let lending_native = self
            .native_price(lending)
            .ok_or(LendingError::PriceUnavailable { token: *lending })?;
        let lend_decimal = self.decimals_of(lending)?;
        Ok(collateral_native * lend_decimal / lending_native)
    }
}
