use crate::core::amount::as_decimal_str;
use crate::core::token::{AccountId, TokenId};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which side of the lending book an order rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Supplies lending token and earns interest.
    Investing,
    /// Locks collateral and receives lending token.
    Borrowing,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Investing => Side::Borrowing,
            Side::Borrowing => Side::Investing,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Investing => write!(f, "INVEST"),
            Side::Borrowing => write!(f, "BORROW"),
        }
    }
}

/// A signed lending order resting on the book.
///
/// Everything except `quantity` is fixed at submission; `quantity` only
/// decreases through partial fills.
///
/// # Examples
///
/// ```
/// use lending_engine::core::order::{LendingOrder, Side};
/// use lending_engine::core::token::{AccountId, TokenId};
/// use num_bigint::BigUint;
///
/// let usdt = TokenId::from_bytes([0xaa; 20]);
/// let mut order = LendingOrder::new(
///     AccountId::from_low_u64(1),
///     Side::Investing,
///     BigUint::from(1_000u32),
///     usdt,
///     TokenId::NATIVE,
///     86_400,
///     BigUint::from(1_000_000_000u32),
/// );
/// order.fill(&BigUint::from(400u32)).unwrap();
/// assert_eq!(order.quantity(), &BigUint::from(600u32));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingOrder {
    id: Uuid,
    owner: AccountId,
    side: Side,
    #[serde(with = "as_decimal_str")]
    quantity: BigUint,
    lending_token: TokenId,
    collateral_token: TokenId,
    /// Loan term in seconds.
    term: u64,
    /// APR scaled by `ProtocolParams::base_lending_interest`.
    #[serde(with = "as_decimal_str")]
    interest_rate: BigUint,
}

/// Attempted to fill more than an order's remaining quantity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("fill of {requested} exceeds remaining quantity {remaining}")]
pub struct OverfillError {
    pub requested: BigUint,
    pub remaining: BigUint,
}

impl LendingOrder {
    pub fn new(
        owner: AccountId,
        side: Side,
        quantity: BigUint,
        lending_token: TokenId,
        collateral_token: TokenId,
        term: u64,
        interest_rate: BigUint,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            side,
            quantity,
            lending_token,
            collateral_token,
            term,
            interest_rate,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn quantity(&self) -> &BigUint {
        &self.quantity
    }

    pub fn lending_token(&self) -> &TokenId {
        &self.lending_token
    }

    pub fn collateral_token(&self) -> &TokenId {
        &self.collateral_token
    }

    pub fn term(&self) -> u64 {
        self.term
    }

    pub fn interest_rate(&self) -> &BigUint {
        &self.interest_rate
    }

    /// Reduce the remaining quantity by `filled`.
    pub fn fill(&mut self, filled: &BigUint) -> Result<(), OverfillError> {
        if filled > &self.quantity {
            return Err(OverfillError {
                requested: filled.clone(),
                remaining: self.quantity.clone(),
            });
        }
        self.quantity -= filled;
        Ok(())
    }

    pub fn is_filled(&self) -> bool {
        self.quantity.is_zero()
    }
}

impl fmt::Display for LendingOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} of {} against {} ({}s)",
            self.id, self.side, self.quantity, self.lending_token, self.collateral_token, self.term
        )
    }
}
