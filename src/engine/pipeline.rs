use crate::core::error::LendingError;
use crate::core::ledger::BalanceLedger;
use crate::core::order::{LendingOrder, Side};
use crate::core::params::{ProtocolEra, ProtocolParams};
use crate::core::token::AccountId;
use crate::core::trade::{MatchedTradeContext, SettlementRecord};
use crate::engine::clamp::BalanceClampEngine;
use crate::engine::settlement::SettlementEngine;
use crate::oracle::{PriceStore, TokenPriceOracle};
use num_bigint::BigUint;
use num_traits::Zero;

/// Result of running one matched pair through clamp, settle and apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub admitted: BigUint,
    pub reject_maker: bool,
    /// `None` when nothing could be admitted.
    pub record: Option<SettlementRecord>,
}

/// Drives a matched pair the way the state-transition executor does:
/// clamp to balances, settle, then move the funds.
///
/// Matches must be processed one at a time in block order: each one reads
/// balances the previous one wrote.
pub struct LendingMatchProcessor<'a> {
    params: &'a ProtocolParams,
}

impl<'a> LendingMatchProcessor<'a> {
    pub fn new(params: &'a ProtocolParams) -> Self {
        Self { params }
    }

    /// Market context for `taker` against `maker`, priced from the oracle's
    /// epoch snapshots.
    pub fn build_context<S: PriceStore>(
        &self,
        oracle: &mut TokenPriceOracle<S>,
        era: ProtocolEra,
        taker: &LendingOrder,
        maker: &LendingOrder,
        deposit_rate: BigUint,
        borrow_fee_rate: BigUint,
    ) -> Result<MatchedTradeContext, LendingError> {
        check_pair(taker, maker)?;
        let borrower = if taker.side() == Side::Borrowing {
            taker
        } else {
            maker
        };
        let lending_token = *taker.lending_token();
        let collateral_token = *borrower.collateral_token();

        Ok(MatchedTradeContext {
            era,
            taker_side: taker.side(),
            lending_token,
            collateral_token,
            lend_token_decimal: oracle.decimals_of(&lending_token)?,
            collateral_token_decimal: oracle.decimals_of(&collateral_token)?,
            collateral_price: oracle.collateral_price(&collateral_token, &lending_token)?,
            deposit_rate,
            borrow_fee_rate,
            lend_token_native_price: oracle.native_price(&lending_token),
        })
    }

    /// Clamp, settle and apply one match, then fill both orders.
    ///
    /// Nothing is written when the admitted quantity is zero or settlement
    /// fails.
    pub fn process(
        &self,
        ledger: &mut BalanceLedger,
        ctx: &MatchedTradeContext,
        taker: &mut LendingOrder,
        maker: &mut LendingOrder,
        relayer: &AccountId,
    ) -> Result<MatchOutcome, LendingError> {
        check_pair(taker, maker)?;
        let requested = taker.quantity().min(maker.quantity()).clone();

        let (taker_token, maker_token) = match ctx.taker_side {
            Side::Borrowing => (ctx.collateral_token, ctx.lending_token),
            Side::Investing => (ctx.lending_token, ctx.collateral_token),
        };
        let taker_balance = ledger.balance(taker.owner(), &taker_token);
        let maker_balance = ledger.balance(maker.owner(), &maker_token);

        let clamped = BalanceClampEngine::clamp(
            ctx.taker_side,
            &ctx.collateral_token_decimal,
            &ctx.deposit_rate,
            &ctx.collateral_price,
            &taker_balance,
            &maker_balance,
            &requested,
        )?;
        if clamped.admitted.is_zero() {
            return Ok(MatchOutcome {
                admitted: clamped.admitted,
                reject_maker: clamped.reject_maker,
                record: None,
            });
        }

        let record = SettlementEngine::new(self.params).settle(ctx, &clamped.admitted)?;
        ledger.apply_settlement(taker.owner(), maker.owner(), relayer, &record)?;

        let overfill = |_| LendingError::InvalidMarketParameter { name: "quantity" };
        taker.fill(&clamped.admitted).map_err(overfill)?;
        maker.fill(&clamped.admitted).map_err(overfill)?;
        log::debug!(
            "settled {} between {} and {}",
            clamped.admitted,
            taker.id(),
            maker.id()
        );

        Ok(MatchOutcome {
            admitted: clamped.admitted,
            reject_maker: clamped.reject_maker,
            record: Some(record),
        })
    }
}

/// Both orders must sit on opposite sides of the same lending market:
/// lending token, collateral token and term all agree.
fn check_pair(taker: &LendingOrder, maker: &LendingOrder) -> Result<(), LendingError> {
    if maker.side() != taker.side().opposite()
        || taker.lending_token() != maker.lending_token()
        || taker.collateral_token() != maker.collateral_token()
        || taker.term() != maker.term()
    {
        return Err(LendingError::InvalidMarketParameter { name: "order_pair" });
    }
    Ok(())
}
