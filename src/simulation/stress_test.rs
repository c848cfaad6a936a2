//! Stress testing utilities for the settlement engines.
//!
//! Generates random matched trades so invariants and throughput can be
//! checked across a wide spread of markets.

use crate::core::amount::{as_decimal_str, pow10};
use crate::core::order::Side;
use crate::core::params::ProtocolEra;
use crate::core::token::TokenId;
use crate::core::trade::MatchedTradeContext;
use num_bigint::BigUint;
use num_traits::One;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating random matched trades.
#[derive(Debug, Clone)]
pub struct TradeConfig {
    /// Number of trades to generate.
    pub trade_count: usize,
    /// Lending token decimals.
    pub lend_decimals: u32,
    /// Collateral is always the native currency (18 decimals).
    pub deposit_rates: Vec<u64>,
    /// Relayer fee rates in basis points.
    pub fee_rates: Vec<u64>,
    /// Whole lending tokens per trade, inclusive range.
    pub min_quantity: u64,
    pub max_quantity: u64,
    /// Share of trades settled under the legacy rules.
    pub legacy_share: f64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            trade_count: 100,
            lend_decimals: 6,
            deposit_rates: vec![125, 150, 200],
            fee_rates: vec![0, 10, 30, 100],
            min_quantity: 10,
            max_quantity: 100_000,
            legacy_share: 0.5,
        }
    }
}

/// A matched trade plus the balances both sides hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub context: MatchedTradeContext,
    #[serde(with = "as_decimal_str")]
    pub quantity: BigUint,
    #[serde(with = "as_decimal_str")]
    pub taker_balance: BigUint,
    #[serde(with = "as_decimal_str")]
    pub maker_balance: BigUint,
}

/// Generate random trades with a fresh entropy source.
pub fn generate_random_trades(config: &TradeConfig) -> Vec<SimulatedTrade> {
    let mut rng = StdRng::from_entropy();
    generate_with(&mut rng, config)
}

/// Generate the same trades for the same `seed`.
pub fn generate_seeded_trades(config: &TradeConfig, seed: u64) -> Vec<SimulatedTrade> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_with(&mut rng, config)
}

fn generate_with<R: Rng>(rng: &mut R, config: &TradeConfig) -> Vec<SimulatedTrade> {
    let lending_token = TokenId::from_bytes([0xaa; 20]);
    let lend_decimal = pow10(config.lend_decimals);
    let mut trades = Vec::with_capacity(config.trade_count);

    for _ in 0..config.trade_count {
        let taker_side = if rng.gen_bool(0.5) {
            Side::Borrowing
        } else {
            Side::Investing
        };
        let era = if rng.gen_bool(config.legacy_share.clamp(0.0, 1.0)) {
            ProtocolEra::Legacy
        } else {
            ProtocolEra::Upgraded
        };
        let whole =
            rng.gen_range(config.min_quantity..=config.max_quantity.max(config.min_quantity));
        let quantity = BigUint::from(whole) * &lend_decimal;

        // 1 native between 0.01 and 10 lending tokens, never below one unit
        let collateral_price = (BigUint::from(rng.gen_range(1u64..=1_000)) * &lend_decimal / 100u32)
            .max(BigUint::one());
        // 1 lending token between 0.1 and 100 native
        let lend_native_price = BigUint::from(rng.gen_range(1u64..=1_000)) * pow10(17);

        let deposit_rate = *config.deposit_rates.choose(rng).unwrap_or(&150);
        let fee_rate = *config.fee_rates.choose(rng).unwrap_or(&0);

        // balances between 0% and 200% of what a full fill needs
        let lend_balance = &quantity * rng.gen_range(0u32..=200) / 100u32;
        let collateral_needed = &quantity * pow10(18) * deposit_rate / 100u32 / &collateral_price;
        let collateral_balance = collateral_needed * rng.gen_range(0u32..=200) / 100u32;
        let (taker_balance, maker_balance) = match taker_side {
            Side::Borrowing => (collateral_balance, lend_balance),
            Side::Investing => (lend_balance, collateral_balance),
        };

        trades.push(SimulatedTrade {
            context: MatchedTradeContext {
                era,
                taker_side,
                lending_token,
                collateral_token: TokenId::NATIVE,
                lend_token_decimal: lend_decimal.clone(),
                collateral_token_decimal: pow10(18),
                collateral_price,
                deposit_rate: BigUint::from(deposit_rate),
                borrow_fee_rate: BigUint::from(fee_rate),
                lend_token_native_price: rng.gen_bool(0.9).then_some(lend_native_price),
            },
            quantity,
            taker_balance,
            maker_balance,
        });
    }

    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::ProtocolParams;
    use crate::engine::clamp::BalanceClampEngine;
    use crate::engine::settlement::SettlementEngine;
    use num_traits::Zero;

    #[test]
    fn test_random_trade_generation() {
        let config = TradeConfig {
            trade_count: 25,
            ..Default::default()
        };
        let trades = generate_random_trades(&config);
        assert_eq!(trades.len(), 25);
        assert!(trades.iter().all(|t| !t.context.collateral_price.is_zero()));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = TradeConfig::default();
        let a = generate_seeded_trades(&config, 7);
        let b = generate_seeded_trades(&config, 7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.context, y.context);
            assert_eq!(x.quantity, y.quantity);
        }
    }

    #[test]
    fn test_coarse_lending_decimals_keep_price_positive() {
        for lend_decimals in [0, 1] {
            let config = TradeConfig {
                trade_count: 200,
                lend_decimals,
                ..Default::default()
            };
            let trades = generate_seeded_trades(&config, 3);
            assert_eq!(trades.len(), 200);
            assert!(trades.iter().all(|t| !t.context.collateral_price.is_zero()));
        }
    }

    #[test]
    fn test_random_trades_settle_consistently() {
        let params = ProtocolParams::default();
        let engine = SettlementEngine::new(&params);
        for trade in generate_seeded_trades(&TradeConfig::default(), 42) {
            let ctx = &trade.context;
            let clamped = BalanceClampEngine::clamp(
                ctx.taker_side,
                &ctx.collateral_token_decimal,
                &ctx.deposit_rate,
                &ctx.collateral_price,
                &trade.taker_balance,
                &trade.maker_balance,
                &trade.quantity,
            )
            .unwrap();
            assert!(clamped.admitted <= trade.quantity);
            if clamped.admitted.is_zero() {
                continue;
            }
            if let Ok(record) = engine.settle(ctx, &clamped.admitted) {
                assert_eq!(record.borrower().gross_in(), clamped.admitted);
                assert_eq!(record.collateral_locked_amount, record.borrower().out_total);
            }
        }
    }
}
