//! A loan from order match to repayment.
//!
//! Prices come from the epoch oracle, the match is clamped to balances and
//! applied to a ledger, the unfilled rest of the order is cancelled, and the
//! repayment is computed for an early and an on-time close.

use lending_engine::core::amount::{pow10, to_display};
use lending_engine::oracle::StaticTokenRegistry;
use lending_engine::prelude::*;
use num_bigint::BigUint;

const DAY: u64 = 86_400;

fn main() {
    env_logger::init();
    println!("╔══════════════════════════════════════════╗");
    println!("║  lending-engine: Loan Lifecycle Example  ║");
    println!("╚══════════════════════════════════════════╝\n");

    let params = ProtocolParams::default();
    let usdt = TokenId::from_bytes([0xaa; 20]);
    let usdt_decimal = pow10(6);
    let mut oracle =
        TokenPriceOracle::new(Box::new(StaticTokenRegistry::new().with_token(usdt, 6)), pow10(18));

    // Last epoch traded USDT at 1.8 and 2.2 native.
    oracle.record_trade(&usdt, &TokenId::NATIVE, BigUint::from(18u32) * pow10(17), &pow10(9));
    oracle.record_trade(&usdt, &TokenId::NATIVE, BigUint::from(22u32) * pow10(17), &pow10(9));
    oracle.roll_epoch();

    let borrower = AccountId::from_low_u64(1);
    let investor = AccountId::from_low_u64(2);
    let relayer = AccountId::from_low_u64(3);
    let mut ledger = BalanceLedger::new();
    ledger.credit(&borrower, &TokenId::NATIVE, &(BigUint::from(1_500u32) * pow10(18)));
    ledger.credit(&investor, &usdt, &(BigUint::from(1_000u32) * &usdt_decimal));

    let apr = BigUint::from(8u32) * &params.base_lending_interest;
    let mut taker = LendingOrder::new(
        borrower,
        Side::Borrowing,
        BigUint::from(800u32) * &usdt_decimal,
        usdt,
        TokenId::NATIVE,
        30 * DAY,
        apr.clone(),
    );
    let mut maker = LendingOrder::new(
        investor,
        Side::Investing,
        BigUint::from(1_000u32) * &usdt_decimal,
        usdt,
        TokenId::NATIVE,
        30 * DAY,
        apr.clone(),
    );

    // --- Match ---
    println!("━━━ Match ━━━\n");
    let processor = LendingMatchProcessor::new(&params);
    let outcome = processor
        .build_context(
            &mut oracle,
            ProtocolEra::Upgraded,
            &taker,
            &maker,
            BigUint::from(150u32),
            BigUint::from(30u32),
        )
        .and_then(|ctx| processor.process(&mut ledger, &ctx, &mut taker, &mut maker, &relayer));
    let record = match outcome {
        Ok(outcome) => match outcome.record {
            Some(record) => record,
            None => {
                println!("nothing admitted");
                return;
            }
        },
        Err(e) => {
            println!("match failed: {}", e);
            return;
        }
    };
    println!("{}", record);
    println!(
        "  Borrower USDT:   {}",
        to_display(&ledger.balance(&borrower, &usdt), &usdt_decimal)
    );
    println!(
        "  Locked native:   {}",
        to_display(&ledger.locked(&borrower, &TokenId::NATIVE), &pow10(18))
    );
    println!(
        "  Relayer USDT:    {}\n",
        to_display(&ledger.balance(&relayer, &usdt), &usdt_decimal)
    );

    // --- Cancel the rest of the investor's order ---
    println!("━━━ Cancel ━━━\n");
    let cancel = CancellationFeeEngine::new(&params);
    let fee = cancel.cancel_fee_valued(
        &mut oracle,
        &maker,
        &pow10(18),
        &BigUint::from(500_000u32),
        &BigUint::from(30u32),
    );
    println!(
        "  Remaining {} USDT cancelled, fee {} USDT (native value {:?})\n",
        to_display(maker.quantity(), &usdt_decimal),
        to_display(&fee.fee, &usdt_decimal),
        fee.native_value,
    );

    // --- Repayment ---
    println!("━━━ Repayment ━━━\n");
    let interest = InterestEngine::new(&params);
    let liquidation = 1_700_000_000 + 30 * DAY;
    let principal = &record.investor().out_total;
    for (label, finalize) in [("day 10", liquidation - 20 * DAY), ("expiry", liquidation)] {
        let due = interest.repayment_value(finalize, liquidation, taker.term(), &apr, principal);
        println!("  Repay at {:<7} {} USDT", label, to_display(&due, &usdt_decimal));
    }
}
