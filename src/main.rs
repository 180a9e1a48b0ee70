//! Tokenized gold engine simulation.
//!
//! Runs the engine through its full lifecycle: swaps against the treasury,
//! collateralized borrowing up to the LTV boundary, a price crash with
//! liquidations, and physical redemption of gold-token.
//!
//! Usage: `emasx-sim [config.toml]`. log level comes from `RUST_LOG`, falling
//! back to `logging.level` in the config.

use anyhow::{Context, Result};
use emasx_core::*;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("emasx.toml"));
    let config = AppConfig::load(&path).with_context(|| format!("loading {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(environment = ?config.environment, "starting simulation");

    println!("Tokenized Gold Engine Simulation");
    println!("Fixed-Price Exchange, Collateralized Lending, Redemption\n");

    scenario_1_swaps(&config)?;
    scenario_2_borrow_to_the_limit(&config)?;
    scenario_3_price_crash(&config)?;
    scenario_4_redemption(&config)?;
    scenario_5_market_estimate(&config)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

fn units(n: u128) -> Result<Amount> {
    Amount::from_units(n).context("amount out of range")
}

/// Fund a user with stablecoin and buy gold with all of it.
fn buy_gold(engine: &mut Engine, account: AccountId, stable: Amount) -> Result<Amount> {
    engine.mint_stable(account, stable)?;
    engine.approve(Asset::Stable, account, TREASURY, stable)?;
    Ok(engine.swap(account, SwapDirection::StableToGold, stable)?.amount_out)
}

/// Post every gold-token in the wallet and borrow the full capacity.
fn max_out_loan(engine: &mut Engine, account: AccountId) -> Result<Amount> {
    let gold = engine.balance_of(Asset::Gold, account);
    engine.approve(Asset::Gold, account, LENDING_POOL, gold)?;
    engine.deposit(account, gold)?;
    let capacity = engine.loan_summary(account)?.borrow_capacity;
    Ok(engine.borrow(account, capacity)?)
}

/// Buy and sell against the treasury at the feed price.
fn scenario_1_swaps(config: &AppConfig) -> Result<()> {
    println!("Scenario 1: Swaps Against the Treasury\n");

    let mut engine = Engine::bootstrap(config)?;
    let alice = AccountId::from_seed(1);

    println!("  Feed price: {} stable per gold", engine.get_price()?);
    println!("  Treasury reserve: {}\n", engine.treasury_reserve());

    let gold = buy_gold(&mut engine, alice, units(5_845_000)?)?;
    println!("  Alice buys with 5,845,000 stable");
    println!("  Received: {} gold", gold);

    let half = Amount::from_raw(gold.raw() / 2);
    let sold = engine.swap(alice, SwapDirection::GoldToStable, half)?;
    println!("  Alice sells {} gold for {} stable (fee {})", half, sold.amount_out, sold.fee);

    let book = engine.treasury_book();
    println!("  Fees collected: {}", book.fees_collected);
    println!("  Gold outstanding: {}", engine.total_supply(Asset::Gold));
    println!("  Trades recorded: {}\n", engine.recent_trades(10).len());
    Ok(())
}

/// Borrow exactly at the max LTV, then try one unit more.
fn scenario_2_borrow_to_the_limit(config: &AppConfig) -> Result<()> {
    println!("Scenario 2: Borrowing at the LTV Boundary\n");

    let mut engine = Engine::bootstrap(config)?;
    let bob = AccountId::from_seed(2);

    buy_gold(&mut engine, bob, units(29_225_000)?)?;
    let debt = max_out_loan(&mut engine, bob)?;

    let summary = engine.loan_summary(bob)?;
    println!("  Collateral: {} gold worth {}", summary.collateral, summary.collateral_value);
    println!("  Debt: {} (max {})", debt, summary.max_debt);
    if let Some(ltv) = summary.ltv_percent {
        println!("  LTV: {}% of {}", ltv, summary.max_ltv);
    }
    if let Some(price) = summary.liquidation_price {
        println!("  Liquidation price: {}", price);
    }

    match engine.borrow(bob, Amount::from_raw(1)) {
        Ok(_) => println!("  One more unit accepted (unexpected)"),
        Err(e) => println!("  One more unit rejected: {e}"),
    }
    match engine.withdraw(bob, Amount::from_raw(1)) {
        Ok(_) => println!("  Withdrawal accepted (unexpected)\n"),
        Err(e) => println!("  Any withdrawal rejected: {e}\n"),
    }
    Ok(())
}

/// Two borrowers at the limit, then the price falls 30% and later 50%.
fn scenario_3_price_crash(config: &AppConfig) -> Result<()> {
    println!("Scenario 3: Price Crash and Liquidations\n");

    let mut engine = Engine::bootstrap(config)?;
    let carol = AccountId::from_seed(3);
    let dave = AccountId::from_seed(4);
    let keeper = AccountId::from_seed(9);

    for account in [carol, dave] {
        buy_gold(&mut engine, account, units(14_612_500)?)?;
        max_out_loan(&mut engine, account)?;
    }
    engine.mint_stable(keeper, units(50_000_000)?)?;
    engine.approve(Asset::Stable, keeper, LENDING_POOL, units(50_000_000)?)?;

    let start = engine.get_price()?;
    let crashed = Price::new(start.raw() / 10 * 7).context("price underflow")?;
    engine.set_price(crashed)?;
    println!("  Price falls 30%: {} -> {}", start, crashed);
    println!("  Liquidatable: {} accounts", engine.liquidatable_accounts()?.len());

    report_liquidation(engine.liquidate(carol, keeper));

    let collapsed = Price::new(start.raw() / 2).context("price underflow")?;
    engine.set_price(collapsed)?;
    println!("  Price falls to half: {}", collapsed);
    report_liquidation(engine.liquidate(dave, keeper));

    let pool = engine.pool_book();
    println!("  Liquidations: {}", pool.liquidation_count);
    println!("  Cumulative bad debt: {}", pool.cumulative_bad_debt);
    println!("  Books balanced: {}\n", engine.audit().is_ok());
    Ok(())
}

fn report_liquidation(outcome: Result<LiquidationResult, EngineError>) {
    match outcome {
        Ok(result) => println!(
            "  Liquidated {}: seized {} gold, repaid {}",
            result.account_id, result.collateral_seized, result.debt_repaid
        ),
        Err(EngineError::BadDebtRemaining(result)) => println!(
            "  Liquidated {}: seized {} gold, repaid {}, bad debt {}",
            result.account_id, result.collateral_seized, result.debt_repaid, result.bad_debt
        ),
        Err(e) => println!("  Liquidation failed: {e}"),
    }
}

/// Claim bars for physical delivery and mark them shipped.
fn scenario_4_redemption(config: &AppConfig) -> Result<()> {
    println!("Scenario 4: Physical Redemption\n");

    let mut engine = Engine::bootstrap(config)?;
    let erin = AccountId::from_seed(5);
    let gold = buy_gold(&mut engine, erin, units(300_000_000)?)?;
    println!("  Erin holds {} gold", gold);

    let receipt = engine.claim_bars(erin, &[(GoldBar::Gram50, 1), (GoldBar::Gram10, 2)])?;
    println!("  Claimed {} as {}", receipt.amount, receipt.redemption_id);
    println!("  Remaining free balance: {}", receipt.remaining_balance);
    println!("  Pending redemptions: {}", engine.pending_redemptions().len());

    engine.mark_fulfilled(receipt.redemption_id)?;
    println!("  Pending after shipment: {}\n", engine.pending_redemptions().len());
    Ok(())
}

/// Advisory market estimate beside the authoritative quote.
fn scenario_5_market_estimate(config: &AppConfig) -> Result<()> {
    println!("Scenario 5: Market Estimate vs Executable Quote\n");

    let engine = Engine::bootstrap(config)?;
    let source = StaticMarketSource::new("spot-aggregator", dec!(2931200));
    let market = source
        .fetch_quote(engine.time())
        .context("market source unavailable")?;

    let amount = units(1_000_000)?;
    let quote = engine.quote_swap(SwapDirection::StableToGold, amount)?;
    let estimate = engine
        .estimate_swap(SwapDirection::StableToGold, amount.to_decimal(), &market)
        .context("market quote unusable")?;

    println!("  Executable: {} gold at feed {}", quote.amount_out, quote.price);
    println!("  Estimate:   {} gold at {} ({})", estimate.amount_out, estimate.market_price, estimate.source);
    if let Some(deviation) = market.deviation_from(engine.get_price()?) {
        println!("  Market deviation from feed: {}%", (deviation * dec!(100)).round_dp(3));
    }
    Ok(())
}
