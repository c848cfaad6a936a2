use crate::core::token::{AccountId, TokenId};
use num_bigint::BigUint;
use thiserror::Error;

/// Failure of a read-only call into a token contract.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContractError {
    #[error("no contract deployed at {0}")]
    NoContract(TokenId),
    #[error("call to {token}.decimals() reverted: {reason}")]
    Reverted { token: TokenId, reason: String },
}

/// Errors produced by the lending settlement engines.
///
/// `TradeTooSmall`, `PriceUnavailable` and `InsufficientBalance` are
/// expected outcomes: the state-transition executor drops or re-queues the
/// order and carries on with the block. The remaining variants mean the
/// caller passed inputs the matching engine must never produce.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LendingError {
    #[error("lending quantity {quantity} too small for fee {fee}")]
    TradeTooSmall { quantity: BigUint, fee: BigUint },

    #[error("collateral price must be positive")]
    InvalidCollateralPrice,

    #[error("no price available for token {token}")]
    PriceUnavailable { token: TokenId },

    #[error("market parameter '{name}' must be positive")]
    InvalidMarketParameter { name: &'static str },

    #[error("account {account} holds {available} of {token}, needs {required}")]
    InsufficientBalance {
        account: AccountId,
        token: TokenId,
        available: BigUint,
        required: BigUint,
    },
}

impl LendingError {
    /// Whether the executor should treat this as a no-op for the order
    /// rather than a defect in the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LendingError::TradeTooSmall { .. }
                | LendingError::PriceUnavailable { .. }
                | LendingError::InsufficientBalance { .. }
        )
    }
}
