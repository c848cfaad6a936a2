use crate::core::amount::{as_decimal_str, opt_as_decimal_str};
use crate::core::order::{LendingOrder, Side};
use crate::core::params::ProtocolParams;
use crate::core::token::TokenId;
use crate::oracle::{PriceStore, TokenPriceOracle};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Fee owed for cancelling a resting order, and where it is debited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationFee {
    /// Fee in lending-token smallest units.
    #[serde(with = "as_decimal_str")]
    pub fee: BigUint,
    pub debit_token: TokenId,
    #[serde(with = "as_decimal_str")]
    pub debit_amount: BigUint,
    /// Fee valued in native smallest units; `None` without a price path.
    #[serde(with = "opt_as_decimal_str")]
    pub native_value: Option<BigUint>,
}

/// Fees charged when a lending order leaves the book unmatched.
///
/// Cancelling never fails: a missing price only leaves the fee unvalued.
pub struct CancellationFeeEngine<'a> {
    params: &'a ProtocolParams,
}

impl<'a> CancellationFeeEngine<'a> {
    pub fn new(params: &'a ProtocolParams) -> Self {
        Self { params }
    }

    /// `quantity * borrow_fee_rate / base_cancel_fee`, the same for both
    /// sides. A zero rate is a waiver.
    pub fn cancel_fee(
        &self,
        _side: Side,
        quantity: &BigUint,
        _collateral_decimal: &BigUint,
        _collateral_price: &BigUint,
        borrow_fee_rate: &BigUint,
    ) -> BigUint {
        if borrow_fee_rate.is_zero() {
            return BigUint::zero();
        }
        quantity * borrow_fee_rate / &self.params.base_cancel_fee
    }

    /// Cancellation fee of `order` with the balance it is charged to.
    ///
    /// Investors pay in lending token. Borrowers hold collateral, so
    /// their fee is converted at `collateral_price`; with no usable price
    /// it stays in lending token.
    pub fn cancel_fee_valued<S: PriceStore>(
        &self,
        oracle: &mut TokenPriceOracle<S>,
        order: &LendingOrder,
        collateral_decimal: &BigUint,
        collateral_price: &BigUint,
        borrow_fee_rate: &BigUint,
    ) -> CancellationFee {
        let fee = self.cancel_fee(
            order.side(),
            order.quantity(),
            collateral_decimal,
            collateral_price,
            borrow_fee_rate,
        );
        let native_value = oracle.native_value(order.lending_token(), &fee);
        if native_value.is_none() {
            log::debug!(
                "cancel fee of order {} has no native price, left unconverted",
                order.id()
            );
        }

        let (debit_token, debit_amount) = match order.side() {
            Side::Borrowing if !collateral_price.is_zero() => (
                *order.collateral_token(),
                &fee * collateral_decimal / collateral_price,
            ),
            _ => (*order.lending_token(), fee.clone()),
        };
        CancellationFee {
            fee,
            debit_token,
            debit_amount,
            native_value,
        }
    }
}
