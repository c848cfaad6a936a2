use crate::core::amount::{as_decimal_str, opt_as_decimal_str};
use crate::core::order::Side;
use crate::core::params::ProtocolEra;
use crate::core::token::TokenId;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market state supplied by the matching engine for one match attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTradeContext {
    /// Derived from block height, never from user input.
    pub era: ProtocolEra,
    /// Side of the order that triggered the match.
    pub taker_side: Side,
    pub lending_token: TokenId,
    pub collateral_token: TokenId,
    #[serde(with = "as_decimal_str")]
    pub lend_token_decimal: BigUint,
    #[serde(with = "as_decimal_str")]
    pub collateral_token_decimal: BigUint,
    /// Price of one whole collateral token in lending-token smallest units.
    #[serde(with = "as_decimal_str")]
    pub collateral_price: BigUint,
    /// Over-collateralisation ratio in percent (150 = 150%).
    #[serde(with = "as_decimal_str")]
    pub deposit_rate: BigUint,
    /// Relayer fee in basis points of the lent quantity.
    #[serde(with = "as_decimal_str")]
    pub borrow_fee_rate: BigUint,
    /// Epoch price of one whole lending token in native smallest units.
    #[serde(with = "opt_as_decimal_str", default)]
    pub lend_token_native_price: Option<BigUint>,
}

/// Net fund movement of one counterparty of a settled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeResult {
    #[serde(with = "as_decimal_str")]
    pub fee: BigUint,
    /// `None` when the party receives nothing at match time.
    pub in_token: Option<TokenId>,
    #[serde(with = "as_decimal_str")]
    pub in_total: BigUint,
    pub out_token: TokenId,
    #[serde(with = "as_decimal_str")]
    pub out_total: BigUint,
}

impl TradeResult {
    /// The lender's leg: supplies `quantity`, pays nothing, receives nothing yet.
    pub fn investor(lending_token: TokenId, quantity: BigUint) -> Self {
        Self {
            fee: BigUint::zero(),
            in_token: None,
            in_total: BigUint::zero(),
            out_token: lending_token,
            out_total: quantity,
        }
    }

    /// Gross quantity of `in_token` moved for this party (`in_total + fee`).
    pub fn gross_in(&self) -> BigUint {
        &self.in_total + &self.fee
    }
}

/// Fund flow of both counterparties for one settled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub taker: TradeResult,
    pub maker: TradeResult,
    /// Always the `out_total` of the borrower's leg.
    #[serde(with = "as_decimal_str")]
    pub collateral_locked_amount: BigUint,
    /// Which role acted as borrower.
    pub borrower_side: Role,
}

/// Taker or maker of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Taker,
    Maker,
}

impl Role {
    /// Role that borrows when the taker's order sits on `taker_side`.
    pub fn borrower_for(taker_side: Side) -> Self {
        match taker_side {
            Side::Borrowing => Role::Taker,
            Side::Investing => Role::Maker,
        }
    }
}

impl SettlementRecord {
    pub fn borrower(&self) -> &TradeResult {
        match self.borrower_side {
            Role::Taker => &self.taker,
            Role::Maker => &self.maker,
        }
    }

    pub fn investor(&self) -> &TradeResult {
        match self.borrower_side {
            Role::Taker => &self.maker,
            Role::Maker => &self.taker,
        }
    }

    /// Lent quantity moved by this match.
    pub fn quantity(&self) -> &BigUint {
        &self.investor().out_total
    }
}

impl fmt::Display for SettlementRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let borrower = self.borrower();
        let investor = self.investor();
        writeln!(f, "=== Settlement ===")?;
        writeln!(f, "Borrower:          {:?}", self.borrower_side)?;
        writeln!(f, "Lent:              {} of {}", investor.out_total, investor.out_token)?;
        writeln!(f, "Borrower receives: {}", borrower.in_total)?;
        writeln!(f, "Relayer fee:       {}", borrower.fee)?;
        writeln!(
            f,
            "Collateral locked: {} of {}",
            self.collateral_locked_amount, borrower.out_token
        )?;
        Ok(())
    }
}
