use crate::core::error::LendingError;
use crate::core::order::Side;
use crate::core::params::{ProtocolEra, ProtocolParams};
use crate::core::trade::{MatchedTradeContext, Role, SettlementRecord, TradeResult};
use crate::engine::clamp::collateral_to_lock;
use num_bigint::BigUint;
use num_traits::Zero;

/// Computes the fund flow of a matched lend/borrow pair.
///
/// Every protocol era has its own settlement function. A new fork adds a
/// variant to [`ProtocolEra`] and a new function beside the existing ones;
/// the old functions stay untouched so historical blocks replay exactly.
pub struct SettlementEngine<'a> {
    params: &'a ProtocolParams,
}

impl<'a> SettlementEngine<'a> {
    pub fn new(params: &'a ProtocolParams) -> Self {
        Self { params }
    }

    /// Settle `quantity_to_lend` of a match under the rules of `ctx.era`.
    ///
    /// # Errors
    ///
    /// - [`LendingError::InvalidCollateralPrice`] for a zero collateral price.
    /// - [`LendingError::TradeTooSmall`] when the quantity does not cover the
    ///   relayer fee or the 1% floor fee, or when either fee is worth no more
    ///   than `minimum_relayer_lending_fee` in native currency.
    pub fn settle(
        &self,
        ctx: &MatchedTradeContext,
        quantity_to_lend: &BigUint,
    ) -> Result<SettlementRecord, LendingError> {
        if ctx.collateral_price.is_zero() {
            return Err(LendingError::InvalidCollateralPrice);
        }
        if ctx.lend_token_decimal.is_zero() {
            return Err(LendingError::InvalidMarketParameter {
                name: "lend_token_decimal",
            });
        }
        let result = match ctx.era {
            ProtocolEra::Legacy => settle_legacy(self.params, ctx, quantity_to_lend),
            ProtocolEra::Upgraded => settle_upgraded(self.params, ctx, quantity_to_lend),
        };
        if let Err(e) = &result {
            log::debug!("{} settlement of {} rejected: {}", ctx.era, quantity_to_lend, e);
        }
        result
    }
}

/// `quantity * rate / base_fee`
pub fn lending_fee(params: &ProtocolParams, quantity: &BigUint, rate: &BigUint) -> BigUint {
    quantity * rate / &params.base_fee
}

/// Rejects trades too small to carry their fees.
///
/// The floor fee uses `default_fee_rate` whatever the relayer configured,
/// so a near-zero relayer rate cannot let dust orders through.
fn check_admissible(
    params: &ProtocolParams,
    ctx: &MatchedTradeContext,
    quantity: &BigUint,
    fee: &BigUint,
) -> Result<(), LendingError> {
    let default_fee = lending_fee(params, quantity, &params.default_fee_rate);
    if quantity <= fee {
        return Err(LendingError::TradeTooSmall {
            quantity: quantity.clone(),
            fee: fee.clone(),
        });
    }
    if quantity <= &default_fee {
        return Err(LendingError::TradeTooSmall {
            quantity: quantity.clone(),
            fee: default_fee,
        });
    }

    let (native_fee, native_default_fee) = if ctx.lending_token.is_native() {
        (fee.clone(), default_fee.clone())
    } else {
        match ctx.lend_token_native_price.as_ref().filter(|p| !p.is_zero()) {
            Some(price) => (
                fee * price / &ctx.lend_token_decimal,
                &default_fee * price / &ctx.lend_token_decimal,
            ),
            // no price path: only the quantity checks apply
            None => return Ok(()),
        }
    };

    let minimum = &params.minimum_relayer_lending_fee;
    if !native_fee.is_zero() && &native_fee <= minimum {
        return Err(LendingError::TradeTooSmall {
            quantity: quantity.clone(),
            fee: fee.clone(),
        });
    }
    if &native_default_fee <= minimum {
        return Err(LendingError::TradeTooSmall {
            quantity: quantity.clone(),
            fee: default_fee,
        });
    }
    Ok(())
}

/// Rules before the lending upgrade: the fee payer is read off the taker's
/// side directly.
fn settle_legacy(
    params: &ProtocolParams,
    ctx: &MatchedTradeContext,
    quantity_to_lend: &BigUint,
) -> Result<SettlementRecord, LendingError> {
    match ctx.taker_side {
        Side::Borrowing => {
            let taker_out_total = collateral_to_lock(
                quantity_to_lend,
                &ctx.collateral_token_decimal,
                &ctx.deposit_rate,
                &ctx.collateral_price,
            );
            let taker_fee = lending_fee(params, quantity_to_lend, &ctx.borrow_fee_rate);
            check_admissible(params, ctx, quantity_to_lend, &taker_fee)?;

            Ok(SettlementRecord {
                taker: TradeResult {
                    in_token: Some(ctx.lending_token),
                    in_total: quantity_to_lend - &taker_fee,
                    fee: taker_fee,
                    out_token: ctx.collateral_token,
                    out_total: taker_out_total.clone(),
                },
                maker: TradeResult::investor(ctx.lending_token, quantity_to_lend.clone()),
                collateral_locked_amount: taker_out_total,
                borrower_side: Role::Taker,
            })
        }
        Side::Investing => {
            let maker_out_total = collateral_to_lock(
                quantity_to_lend,
                &ctx.collateral_token_decimal,
                &ctx.deposit_rate,
                &ctx.collateral_price,
            );
            let maker_fee = lending_fee(params, quantity_to_lend, &ctx.borrow_fee_rate);
            check_admissible(params, ctx, quantity_to_lend, &maker_fee)?;

            Ok(SettlementRecord {
                taker: TradeResult::investor(ctx.lending_token, quantity_to_lend.clone()),
                maker: TradeResult {
                    in_token: Some(ctx.lending_token),
                    in_total: quantity_to_lend - &maker_fee,
                    fee: maker_fee,
                    out_token: ctx.collateral_token,
                    out_total: maker_out_total.clone(),
                },
                collateral_locked_amount: maker_out_total,
                borrower_side: Role::Maker,
            })
        }
    }
}

/// Rules from the lending upgrade on: the borrower's leg is built on its
/// own, independent of who took, and only then placed on the taker or
/// maker side.
fn settle_upgraded(
    params: &ProtocolParams,
    ctx: &MatchedTradeContext,
    quantity_to_lend: &BigUint,
) -> Result<SettlementRecord, LendingError> {
    let fee = lending_fee(params, quantity_to_lend, &ctx.borrow_fee_rate);
    check_admissible(params, ctx, quantity_to_lend, &fee)?;

    let borrower = TradeResult {
        in_token: Some(ctx.lending_token),
        in_total: quantity_to_lend - &fee,
        fee,
        out_token: ctx.collateral_token,
        out_total: collateral_to_lock(
            quantity_to_lend,
            &ctx.collateral_token_decimal,
            &ctx.deposit_rate,
            &ctx.collateral_price,
        ),
    };
    let investor = TradeResult::investor(ctx.lending_token, quantity_to_lend.clone());
    let collateral_locked_amount = borrower.out_total.clone();

    let borrower_side = Role::borrower_for(ctx.taker_side);
    let (taker, maker) = match borrower_side {
        Role::Taker => (borrower, investor),
        Role::Maker => (investor, borrower),
    };
    Ok(SettlementRecord {
        taker,
        maker,
        collateral_locked_amount,
        borrower_side,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amount::pow10;
    use crate::core::token::TokenId;

    fn usdt() -> TokenId {
        TokenId::from_bytes([0xaa; 20])
    }

    fn n(v: u64) -> BigUint {
        BigUint::from(v)
    }

    /// USDT (6 decimals) lent against native collateral.
    /// 1 native = 0.5 USDT, 1 USDT = 2 native.
    fn ctx(era: ProtocolEra, taker_side: Side, fee_rate: u64) -> MatchedTradeContext {
        MatchedTradeContext {
            era,
            taker_side,
            lending_token: usdt(),
            collateral_token: TokenId::NATIVE,
            lend_token_decimal: pow10(6),
            collateral_token_decimal: pow10(18),
            collateral_price: n(500_000),
            deposit_rate: n(150),
            borrow_fee_rate: n(fee_rate),
            lend_token_native_price: Some(n(2) * pow10(18)),
        }
    }

    #[test]
    fn test_borrowing_taker_pays_fee_and_locks() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let quantity = n(1_000) * pow10(6); // 1000 USDT
        for era in [ProtocolEra::Legacy, ProtocolEra::Upgraded] {
            let record = engine
                .settle(&ctx(era, Side::Borrowing, 30), &quantity)
                .unwrap();
            assert_eq!(record.borrower_side, Role::Taker);
            assert_eq!(record.taker.fee, n(3_000_000)); // 0.3%
            assert_eq!(record.taker.in_total, n(997_000_000));
            assert_eq!(record.taker.in_token, Some(usdt()));
            // 1000 USDT * 150% / 0.5 = 3000 native
            assert_eq!(record.taker.out_total, n(3_000) * pow10(18));
            assert_eq!(record.maker, TradeResult::investor(usdt(), quantity.clone()));
            assert_eq!(record.collateral_locked_amount, record.taker.out_total);
        }
    }

    #[test]
    fn test_investing_taker_makes_maker_borrower() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let quantity = n(1_000) * pow10(6);
        for era in [ProtocolEra::Legacy, ProtocolEra::Upgraded] {
            let record = engine
                .settle(&ctx(era, Side::Investing, 30), &quantity)
                .unwrap();
            assert_eq!(record.borrower_side, Role::Maker);
            assert_eq!(record.taker, TradeResult::investor(usdt(), quantity.clone()));
            assert_eq!(record.maker.fee, n(3_000_000));
            assert_eq!(record.collateral_locked_amount, record.maker.out_total);
            assert_eq!(record.maker.gross_in(), quantity);
        }
    }

    #[test]
    fn test_eras_agree() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let quantity = n(123_456_789);
        for side in [Side::Borrowing, Side::Investing] {
            for rate in [0, 1, 30, 250] {
                let legacy = engine.settle(&ctx(ProtocolEra::Legacy, side, rate), &quantity);
                let upgraded = engine.settle(&ctx(ProtocolEra::Upgraded, side, rate), &quantity);
                assert_eq!(legacy, upgraded);
            }
        }
    }

    #[test]
    fn test_zero_fee_rate_waives_fee() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let quantity = n(1_000) * pow10(6);
        let record = engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 0), &quantity)
            .unwrap();
        assert_eq!(record.taker.fee, BigUint::zero());
        assert_eq!(record.taker.in_total, quantity);
    }

    #[test]
    fn test_fee_at_or_above_quantity_rejected() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        // 100% fee
        let err = engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 10_000), &n(10_000))
            .unwrap_err();
        assert!(matches!(err, LendingError::TradeTooSmall { .. }));
    }

    #[test]
    fn test_default_floor_applies_with_fee_waiver() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        // 1% floor of 1 USDT is 0.01 USDT = 0.02 native, above the 0.01 native minimum
        assert!(engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 0), &pow10(6))
            .is_ok());
        // 1% floor of 0.4 USDT is 0.008 native: rejected even with no relayer fee
        let err = engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 0), &n(400_000))
            .unwrap_err();
        assert_eq!(
            err,
            LendingError::TradeTooSmall {
                quantity: n(400_000),
                fee: n(4_000),
            }
        );
    }

    #[test]
    fn test_quantity_not_above_floor_fee_rejected() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let mut c = ctx(ProtocolEra::Legacy, Side::Investing, 0);
        c.lend_token_native_price = None;
        // floor fee of 99 truncates to 0, quantity 1 > 0 passes quantity checks
        assert!(engine.settle(&c, &n(1)).is_ok());
        let p = ProtocolParams {
            default_fee_rate: n(10_000),
            ..Default::default()
        };
        let strict = SettlementEngine::new(&p);
        assert!(matches!(
            strict.settle(&c, &n(50)),
            Err(LendingError::TradeTooSmall { .. })
        ));
    }

    #[test]
    fn test_relayer_fee_below_native_minimum_rejected() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        // 100 USDT at 0.01%: fee 0.01 USDT = 0.02 native, passes
        assert!(engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 1), &(n(100) * pow10(6)))
            .is_ok());
        // 40 USDT at 0.01%: fee 0.004 USDT = 0.008 native, too small
        let err = engine
            .settle(&ctx(ProtocolEra::Upgraded, Side::Borrowing, 1), &(n(40) * pow10(6)))
            .unwrap_err();
        assert_eq!(
            err,
            LendingError::TradeTooSmall {
                quantity: n(40) * pow10(6),
                fee: n(4_000),
            }
        );
    }

    #[test]
    fn test_native_lending_token_uses_raw_fee() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let mut c = ctx(ProtocolEra::Legacy, Side::Borrowing, 30);
        c.lending_token = TokenId::NATIVE;
        c.lend_token_decimal = pow10(18);
        c.collateral_token = usdt();
        c.collateral_token_decimal = pow10(6);
        c.collateral_price = n(2) * pow10(18);
        c.lend_token_native_price = None;
        // fee of 0.003 native and floor of 0.01 native are both at the minimum or below
        assert!(engine.settle(&c, &pow10(18)).is_err());
        let record = engine.settle(&c, &(n(10) * pow10(18))).unwrap();
        assert_eq!(record.taker.fee, n(3) * pow10(16));
        // 10 native * 150% / 2 = 7.5 USDT
        assert_eq!(record.collateral_locked_amount, n(7_500_000));
    }

    #[test]
    fn test_no_price_path_skips_native_minimum() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let mut c = ctx(ProtocolEra::Upgraded, Side::Investing, 30);
        c.lend_token_native_price = None;
        assert!(engine.settle(&c, &n(10_000)).is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        let mut c = ctx(ProtocolEra::Legacy, Side::Borrowing, 30);
        c.collateral_price = BigUint::zero();
        assert_eq!(
            engine.settle(&c, &pow10(9)),
            Err(LendingError::InvalidCollateralPrice)
        );
        let mut c = ctx(ProtocolEra::Upgraded, Side::Borrowing, 30);
        c.lend_token_decimal = BigUint::zero();
        assert!(matches!(
            engine.settle(&c, &pow10(9)),
            Err(LendingError::InvalidMarketParameter { .. })
        ));
    }
}
