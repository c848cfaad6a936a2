//! lending-engine CLI
//!
//! Run settlement, clamping and fee arithmetic from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Clamp and settle simulated trades from a JSON file
//! lending-engine settle --input trades.json
//!
//! # Output as JSON, with custom protocol constants
//! lending-engine settle --input trades.json --format json --params params.json
//!
//! # Interest due on a 30 day loan repaid at liquidation time
//! lending-engine interest --finalize 1700000000 --liquidation 1700000000 \
//!     --term 2592000 --apr 1000000000 --principal 1000000
//!
//! # Generate random trades for testing
//! lending-engine generate --trades 50 --seed 7
//! ```

use lending_engine::core::amount::{as_decimal_str, pow10, to_display};
use lending_engine::core::order::Side;
use lending_engine::core::params::ProtocolParams;
use lending_engine::engine::{
    BalanceClampEngine, CancellationFeeEngine, InterestEngine, SettlementEngine,
};
use lending_engine::simulation::stress_test::{
    generate_random_trades, generate_seeded_trades, SimulatedTrade, TradeConfig,
};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"lending-engine: lending market settlement and fee arithmetic

USAGE:
    lending-engine <COMMAND> [OPTIONS]

COMMANDS:
    settle      Clamp and settle matched trades from a JSON file
    clamp       Fit a match quantity to both sides' balances
    interest    Compute the interest rate and repayment of a loan
    cancel-fee  Compute the fee for cancelling an order
    generate    Generate random matched trades (for testing)
    help        Show this message

OPTIONS (all commands):
    --params <FILE>     Protocol constants as JSON (missing fields use defaults)

OPTIONS (settle):
    --input <FILE>      Path to a JSON list of trades
    --format <FORMAT>   Output format: text (default) or json

OPTIONS (clamp):
    --side <SIDE>               Taker side: borrow or invest
    --collateral-decimal <N>    Collateral token decimal (default: 10^18)
    --deposit-rate <N>          Collateral ratio in percent
    --price <N>                 Collateral price in lending-token units
    --taker-balance <N>
    --maker-balance <N>
    --quantity <N>

OPTIONS (interest):
    --finalize <SECS>   Repayment timestamp
    --liquidation <SECS> Loan expiry timestamp
    --term <SECS>       Loan term
    --apr <N>           Annual rate scaled by base_lending_interest
    --principal <N>     Optional principal to compute the repayment of

OPTIONS (cancel-fee):
    --quantity <N>      Unfilled order quantity
    --rate <N>          Borrow fee rate in basis points

OPTIONS (generate):
    --trades <N>        Number of trades (default: 100)
    --seed <N>          Seed for reproducible output
    --output <FILE>     Write to file instead of stdout

EXAMPLES:
    lending-engine generate --trades 20 --seed 1 --output trades.json
    lending-engine settle --input trades.json --format json
    lending-engine clamp --side borrow --deposit-rate 150 --price 1000000000000000000 \
        --taker-balance 75 --maker-balance 1000 --quantity 100
    lending-engine cancel-fee --quantity 10000 --rate 30"#
    );
}

/// Returns the value following the flag at `args[*i]`, advancing `i`.
fn flag_value(args: &[String], i: &mut usize) -> String {
    let flag = &args[*i];
    *i += 1;
    args.get(*i).cloned().unwrap_or_else(|| {
        eprintln!("{} requires a value", flag);
        process::exit(1);
    })
}

fn parse_amount(flag: &str, value: &str) -> BigUint {
    value.parse().unwrap_or_else(|e| {
        eprintln!("Invalid amount for {} '{}': {}", flag, value, e);
        process::exit(1);
    })
}

fn parse_u64(flag: &str, value: &str) -> u64 {
    value.parse().unwrap_or_else(|e| {
        eprintln!("Invalid number for {} '{}': {}", flag, value, e);
        process::exit(1);
    })
}

fn load_params(path: Option<&str>) -> ProtocolParams {
    let Some(path) = path else {
        return ProtocolParams::default();
    };
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading params '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing params JSON: {}", e);
        process::exit(1);
    })
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding JSON: {}", e);
            process::exit(1);
        }
    }
}

fn load_trades(path: &str) -> Vec<SimulatedTrade> {
    let content = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading file '{}': {}", path, e);
        process::exit(1);
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing JSON: {}", e);
        eprintln!("Expected a list of trades as written by `lending-engine generate`");
        process::exit(1);
    })
}

/// JSON output schema for one settled trade.
#[derive(Serialize)]
struct SettleOutput {
    #[serde(with = "as_decimal_str")]
    requested: BigUint,
    #[serde(with = "as_decimal_str")]
    admitted: BigUint,
    reject_maker: bool,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<lending_engine::core::trade::SettlementRecord>,
}

fn cmd_settle(args: &[String]) {
    let mut input_path = None;
    let mut params_path = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => input_path = Some(flag_value(args, &mut i)),
            "--params" => params_path = Some(flag_value(args, &mut i)),
            "--format" => format = flag_value(args, &mut i),
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });

    let params = load_params(params_path.as_deref());
    let engine = SettlementEngine::new(&params);
    let mut outputs = Vec::new();

    for trade in load_trades(&path) {
        let ctx = &trade.context;
        let clamped = BalanceClampEngine::clamp(
            ctx.taker_side,
            &ctx.collateral_token_decimal,
            &ctx.deposit_rate,
            &ctx.collateral_price,
            &trade.taker_balance,
            &trade.maker_balance,
            &trade.quantity,
        );
        let output = match clamped {
            Err(e) => SettleOutput {
                requested: trade.quantity.clone(),
                admitted: BigUint::zero(),
                reject_maker: false,
                status: format!("INVALID: {}", e),
                record: None,
            },
            Ok(clamped) if clamped.admitted.is_zero() => SettleOutput {
                requested: trade.quantity.clone(),
                admitted: BigUint::zero(),
                reject_maker: clamped.reject_maker,
                status: "SKIPPED".to_string(),
                record: None,
            },
            Ok(clamped) => match engine.settle(ctx, &clamped.admitted) {
                Ok(record) => SettleOutput {
                    requested: trade.quantity.clone(),
                    admitted: clamped.admitted.clone(),
                    reject_maker: clamped.reject_maker,
                    status: "SETTLED".to_string(),
                    record: Some(record),
                },
                Err(e) => SettleOutput {
                    requested: trade.quantity.clone(),
                    admitted: clamped.admitted.clone(),
                    reject_maker: clamped.reject_maker,
                    status: format!("REJECTED: {}", e),
                    record: None,
                },
            },
        };

        if format != "json" {
            println!(
                "[{}] {} requested {} ({}), admitted {}",
                ctx.era,
                ctx.taker_side,
                to_display(&trade.quantity, &ctx.lend_token_decimal),
                ctx.lending_token,
                to_display(&output.admitted, &ctx.lend_token_decimal),
            );
            match &output.record {
                Some(record) => println!("{}", record),
                None => println!("  {}\n", output.status),
            }
        }
        outputs.push(output);
    }

    if format == "json" {
        print_json(&outputs);
    } else {
        let settled = outputs.iter().filter(|o| o.record.is_some()).count();
        println!("Settled {} of {} trades", settled, outputs.len());
    }
}

fn cmd_clamp(args: &[String]) {
    let mut side = None;
    let mut collateral_decimal = pow10(18);
    let mut deposit_rate = None;
    let mut price = None;
    let mut taker_balance = BigUint::zero();
    let mut maker_balance = BigUint::zero();
    let mut quantity = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--side" => {
                side = Some(match flag_value(args, &mut i).as_str() {
                    "borrow" | "borrowing" => Side::Borrowing,
                    "invest" | "investing" => Side::Investing,
                    other => {
                        eprintln!("--side must be 'borrow' or 'invest', got '{}'", other);
                        process::exit(1);
                    }
                })
            }
            "--collateral-decimal" => {
                collateral_decimal = parse_amount(&flag, &flag_value(args, &mut i))
            }
            "--deposit-rate" => deposit_rate = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            "--price" => price = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            "--taker-balance" => taker_balance = parse_amount(&flag, &flag_value(args, &mut i)),
            "--maker-balance" => maker_balance = parse_amount(&flag, &flag_value(args, &mut i)),
            "--quantity" => quantity = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(side), Some(deposit_rate), Some(price), Some(quantity)) =
        (side, deposit_rate, price, quantity)
    else {
        eprintln!("Error: --side, --deposit-rate, --price and --quantity are required");
        process::exit(1);
    };

    match BalanceClampEngine::clamp(
        side,
        &collateral_decimal,
        &deposit_rate,
        &price,
        &taker_balance,
        &maker_balance,
        &quantity,
    ) {
        Ok(outcome) => print_json(&outcome),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

fn cmd_interest(args: &[String]) {
    let mut params_path = None;
    let mut finalize = None;
    let mut liquidation = None;
    let mut term = None;
    let mut apr = None;
    let mut principal = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--params" => params_path = Some(flag_value(args, &mut i)),
            "--finalize" => finalize = Some(parse_u64(&flag, &flag_value(args, &mut i))),
            "--liquidation" => liquidation = Some(parse_u64(&flag, &flag_value(args, &mut i))),
            "--term" => term = Some(parse_u64(&flag, &flag_value(args, &mut i))),
            "--apr" => apr = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            "--principal" => principal = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(finalize), Some(liquidation), Some(term), Some(apr)) =
        (finalize, liquidation, term, apr)
    else {
        eprintln!("Error: --finalize, --liquidation, --term and --apr are required");
        process::exit(1);
    };

    let params = load_params(params_path.as_deref());
    let engine = InterestEngine::new(&params);
    let rate = engine.interest_rate(finalize, liquidation, term, &apr);
    let percent = &params.base_lending_interest;

    println!("Loan start:     {}", format_timestamp(liquidation.saturating_sub(term)));
    println!("Liquidation:    {}", format_timestamp(liquidation));
    println!("Finalized:      {}", format_timestamp(finalize));
    println!("Interest rate:  {} ({}%)", rate, to_display(&rate, percent));
    if let Some(principal) = principal {
        let due = engine.repayment_value(finalize, liquidation, term, &apr, &principal);
        println!("Repayment:      {}", due);
    }
}

fn cmd_cancel_fee(args: &[String]) {
    let mut params_path = None;
    let mut quantity = None;
    let mut rate = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--params" => params_path = Some(flag_value(args, &mut i)),
            "--quantity" => quantity = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            "--rate" => rate = Some(parse_amount(&flag, &flag_value(args, &mut i))),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (Some(quantity), Some(rate)) = (quantity, rate) else {
        eprintln!("Error: --quantity and --rate are required");
        process::exit(1);
    };

    let params = load_params(params_path.as_deref());
    let engine = CancellationFeeEngine::new(&params);
    // the fee does not depend on side or collateral
    let one = BigUint::from(1u32);
    let fee = engine.cancel_fee(Side::Investing, &quantity, &one, &one, &rate);
    println!("{}", fee);
}

fn cmd_generate(args: &[String]) {
    let mut trade_count = 100usize;
    let mut seed = None;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].clone();
        match flag.as_str() {
            "--trades" => {
                trade_count = flag_value(args, &mut i).parse().unwrap_or_else(|_| {
                    eprintln!("--trades requires a number");
                    process::exit(1);
                })
            }
            "--seed" => seed = Some(parse_u64(&flag, &flag_value(args, &mut i))),
            "--output" => output_path = Some(flag_value(args, &mut i)),
            _ => {
                eprintln!("Unknown option: {}", flag);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = TradeConfig {
        trade_count,
        ..Default::default()
    };
    let trades = match seed {
        Some(seed) => generate_seeded_trades(&config, seed),
        None => generate_random_trades(&config),
    };

    let json = serde_json::to_string_pretty(&trades).unwrap_or_else(|e| {
        eprintln!("Error encoding JSON: {}", e);
        process::exit(1);
    });

    if let Some(path) = output_path {
        fs::write(&path, &json).unwrap_or_else(|e| {
            eprintln!("Error writing to '{}': {}", path, e);
            process::exit(1);
        });
        eprintln!("Generated {} trades → {}", trades.len(), path);
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "settle" => cmd_settle(rest),
        "clamp" => cmd_clamp(rest),
        "interest" => cmd_interest(rest),
        "cancel-fee" => cmd_cancel_fee(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
