use crate::core::error::LendingError;
use crate::core::order::Side;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Quantity of a match that can actually settle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClampOutcome {
    #[serde(with = "crate::core::amount::as_decimal_str")]
    pub admitted: BigUint,
    /// The maker's balance is what limited the fill; the caller drops or
    /// re-queues the resting order.
    pub reject_maker: bool,
}

impl ClampOutcome {
    fn new(admitted: BigUint, reject_maker: bool) -> Self {
        Self {
            admitted,
            reject_maker,
        }
    }
}

/// Collateral a borrower must lock to receive `quantity` of lending token:
/// `quantity * collateral_decimal * deposit_rate / 100 / collateral_price`.
pub fn collateral_to_lock(
    quantity: &BigUint,
    collateral_decimal: &BigUint,
    deposit_rate: &BigUint,
    collateral_price: &BigUint,
) -> BigUint {
    quantity * collateral_decimal * deposit_rate / 100u32 / collateral_price
}

/// Largest lending quantity `collateral` can secure; the inverse of
/// [`collateral_to_lock`] in the same truncating integer arithmetic.
pub fn lendable_against(
    collateral: &BigUint,
    collateral_decimal: &BigUint,
    deposit_rate: &BigUint,
    collateral_price: &BigUint,
) -> BigUint {
    collateral * collateral_price * 100u32 / deposit_rate / collateral_decimal
}

fn validate(
    collateral_decimal: &BigUint,
    deposit_rate: &BigUint,
    collateral_price: &BigUint,
) -> Result<(), LendingError> {
    if collateral_price.is_zero() {
        return Err(LendingError::InvalidCollateralPrice);
    }
    if deposit_rate.is_zero() {
        return Err(LendingError::InvalidMarketParameter {
            name: "deposit_rate",
        });
    }
    if collateral_decimal.is_zero() {
        return Err(LendingError::InvalidMarketParameter {
            name: "collateral_token_decimal",
        });
    }
    Ok(())
}

/// Fits a requested match quantity to the balances both sides hold.
pub struct BalanceClampEngine;

impl BalanceClampEngine {
    /// Admitted quantity for a match of `requested` lending token.
    ///
    /// The borrower is the taker when `taker_side` is `Borrowing`, the
    /// maker otherwise. The investor must hold `requested` of the lending
    /// token; the borrower must hold [`collateral_to_lock`] of collateral.
    /// A short side scales the fill down, always measured in lending-token
    /// units.
    ///
    /// # Examples
    ///
    /// ```
    /// use lending_engine::core::order::Side;
    /// use lending_engine::engine::clamp::BalanceClampEngine;
    /// use num_bigint::BigUint;
    ///
    /// let n = |v: u64| BigUint::from(v);
    /// // borrower (taker) can lock 75 collateral at 150%: 50 lendable
    /// let out = BalanceClampEngine::clamp(
    ///     Side::Borrowing, &n(1), &n(150), &n(1), &n(75), &n(1_000), &n(100),
    /// ).unwrap();
    /// assert_eq!(out.admitted, n(50));
    /// assert!(!out.reject_maker);
    /// ```
    pub fn clamp(
        taker_side: Side,
        collateral_decimal: &BigUint,
        deposit_rate: &BigUint,
        collateral_price: &BigUint,
        taker_balance: &BigUint,
        maker_balance: &BigUint,
        requested: &BigUint,
    ) -> Result<ClampOutcome, LendingError> {
        validate(collateral_decimal, deposit_rate, collateral_price)?;

        let borrower_is_maker = taker_side == Side::Investing;
        let (borrower_balance, investor_balance) = if borrower_is_maker {
            (maker_balance, taker_balance)
        } else {
            (taker_balance, maker_balance)
        };

        if requested.is_zero() || investor_balance.is_zero() {
            return Ok(ClampOutcome::new(BigUint::zero(), false));
        }
        if borrower_balance.is_zero() {
            log::debug!("borrower has no collateral, maker rejected: {}", borrower_is_maker);
            return Ok(ClampOutcome::new(BigUint::zero(), borrower_is_maker));
        }

        let required =
            collateral_to_lock(requested, collateral_decimal, deposit_rate, collateral_price);
        let borrower_capacity = if borrower_balance >= &required {
            requested.clone()
        } else {
            lendable_against(borrower_balance, collateral_decimal, deposit_rate, collateral_price)
                .min(requested.clone())
        };
        let investor_capacity = investor_balance.min(requested).clone();

        let admitted = (&borrower_capacity).min(&investor_capacity).clone();
        if &admitted == requested {
            return Ok(ClampOutcome::new(admitted, false));
        }

        let maker_capacity = if borrower_is_maker {
            &borrower_capacity
        } else {
            &investor_capacity
        };
        let reject_maker = *maker_capacity == admitted;
        log::debug!(
            "match clamped from {} to {} (borrower capacity {}, investor capacity {})",
            requested,
            admitted,
            borrower_capacity,
            investor_capacity
        );
        Ok(ClampOutcome::new(admitted, reject_maker))
    }
}
