//! Settling one matched lend/borrow pair under both protocol eras.
//!
//! Shows the fee, net principal and locked collateral for a borrowing
//! taker and an investing taker.

use lending_engine::core::amount::{pow10, to_display};
use lending_engine::prelude::*;
use num_bigint::BigUint;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  lending-engine: Settle a Matched Trade  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let params = ProtocolParams::default();
    let engine = SettlementEngine::new(&params);
    let usdt = TokenId::from_bytes([0xaa; 20]);
    let usdt_decimal = pow10(6);

    for (era, taker_side) in [
        (ProtocolEra::Legacy, Side::Borrowing),
        (ProtocolEra::Upgraded, Side::Investing),
    ] {
        println!("━━━ {} era, taker {} ━━━\n", era, taker_side);

        let ctx = MatchedTradeContext {
            era,
            taker_side,
            lending_token: usdt,
            collateral_token: TokenId::NATIVE,
            lend_token_decimal: usdt_decimal.clone(),
            collateral_token_decimal: pow10(18),
            // 1 native = 0.5 USDT
            collateral_price: BigUint::from(500_000u32),
            deposit_rate: BigUint::from(150u32),
            borrow_fee_rate: BigUint::from(30u32),
            lend_token_native_price: Some(BigUint::from(2u32) * pow10(18)),
        };

        let quantity = BigUint::from(1_000u32) * &usdt_decimal;
        match engine.settle(&ctx, &quantity) {
            Ok(record) => {
                println!("{}", record);
                let borrower = record.borrower();
                println!(
                    "  Borrower receives {} USDT, pays {} USDT fee, locks {} native\n",
                    to_display(&borrower.in_total, &usdt_decimal),
                    to_display(&borrower.fee, &usdt_decimal),
                    to_display(&record.collateral_locked_amount, &pow10(18)),
                );
            }
            Err(e) => println!("  rejected: {}\n", e),
        }
    }

    // --- Dust is rejected ---
    println!("━━━ Dust trade ━━━\n");
    let ctx = MatchedTradeContext {
        era: ProtocolEra::Upgraded,
        taker_side: Side::Borrowing,
        lending_token: usdt,
        collateral_token: TokenId::NATIVE,
        lend_token_decimal: usdt_decimal.clone(),
        collateral_token_decimal: pow10(18),
        collateral_price: BigUint::from(500_000u32),
        deposit_rate: BigUint::from(150u32),
        borrow_fee_rate: BigUint::from(30u32),
        lend_token_native_price: Some(BigUint::from(2u32) * pow10(18)),
    };
    match engine.settle(&ctx, &BigUint::from(100u32)) {
        Ok(record) => println!("{}", record),
        Err(e) => println!("  0.0001 USDT: {}", e),
    }
}
