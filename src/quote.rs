//! Read-only quotes for display.
//!
//! Two prices exist and are never mixed:
//! - the authoritative feed price (`price_feed`), which every execution uses;
//! - an external market price (`MarketQuote`), fetched for display only.
//!
//! Nothing in this module mutates engine state. `SwapEstimate` is computed in
//! `Decimal` from a market quote and may differ from what a swap executes at.
//! `LoanSummary` is derived from one authoritative feed sample.

use crate::config::ProtocolParams;
use crate::liquidation::liquidation_price;
use crate::ltv;
use crate::math::MathError;
use crate::position::Position;
use crate::types::{Amount, Bps, Percent, Price, SwapDirection, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An external market price. Advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Stablecoin per gold-token
    pub price: Decimal,
    pub source: String,
    pub observed_at: Timestamp,
}

impl MarketQuote {
    pub fn new(price: Decimal, source: &str, observed_at: Timestamp) -> Self {
        Self {
            price,
            source: source.to_string(),
            observed_at,
        }
    }

    pub fn is_stale(&self, now: Timestamp, max_age_ms: i64) -> bool {
        self.observed_at.elapsed_millis(&now) > max_age_ms
    }

    /// Relative gap to the feed price, e.g. 0.01 for 1% above.
    pub fn deviation_from(&self, feed: Price) -> Option<Decimal> {
        let feed = feed.to_decimal();
        if feed.is_zero() {
            return None;
        }
        Some((self.price - feed) / feed)
    }
}

/// Anything that can hand out a market quote (exchange API, aggregator, fixture).
pub trait MarketPriceSource {
    fn name(&self) -> &str;

    fn fetch_quote(&self, now: Timestamp) -> Option<MarketQuote>;

    fn is_healthy(&self) -> bool;
}

/// Fixed-price source for simulations and tests
#[derive(Debug, Clone)]
pub struct StaticMarketSource {
    name: String,
    price: Decimal,
    healthy: bool,
}

impl StaticMarketSource {
    pub fn new(name: &str, price: Decimal) -> Self {
        Self {
            name: name.to_string(),
            price,
            healthy: true,
        }
    }

    pub fn set_price(&mut self, price: Decimal) {
        self.price = price;
    }

    pub fn set_healthy(&mut self, healthy: bool) {
        self.healthy = healthy;
    }
}

impl MarketPriceSource for StaticMarketSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_quote(&self, now: Timestamp) -> Option<MarketQuote> {
        if self.healthy {
            Some(MarketQuote::new(self.price, &self.name, now))
        } else {
            None
        }
    }

    fn is_healthy(&self) -> bool {
        self.healthy
    }
}

/// Display estimate of a swap at a market price. Not a commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEstimate {
    pub direction: SwapDirection,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    /// In stablecoin
    pub fee: Decimal,
    pub market_price: Decimal,
    pub source: String,
}

/// `None` for a non-positive market price or a negative amount.
pub fn estimate_swap(
    direction: SwapDirection,
    amount_in: Decimal,
    quote: &MarketQuote,
    fee_bps: Bps,
) -> Option<SwapEstimate> {
    if quote.price <= Decimal::ZERO || amount_in < Decimal::ZERO {
        return None;
    }
    let fee_rate = fee_bps.as_fraction();
    let (amount_out, fee) = match direction {
        SwapDirection::StableToGold => {
            let out = amount_in.checked_div(quote.price)? * (Decimal::ONE - fee_rate);
            (out, amount_in.checked_mul(fee_rate)?)
        }
        SwapDirection::GoldToStable => {
            let gross = amount_in.checked_mul(quote.price)?;
            (gross * (Decimal::ONE - fee_rate), gross * fee_rate)
        }
    };

    Some(SwapEstimate {
        direction,
        amount_in,
        amount_out,
        fee,
        market_price: quote.price,
        source: quote.source.clone(),
    })
}

/// Loan page figures from one feed sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSummary {
    pub collateral: Amount,
    pub debt: Amount,
    pub collateral_value: Amount,
    /// Current LTV as a percentage, `None` without collateral
    pub ltv_percent: Option<Decimal>,
    pub max_ltv: Percent,
    pub liquidation_ltv: Percent,
    pub max_debt: Amount,
    pub borrow_capacity: Amount,
    pub max_withdrawable: Amount,
    pub liquidation_price: Option<Price>,
    /// Nominal, display only
    pub annual_interest: Decimal,
    pub feed_price: Price,
}

impl LoanSummary {
    pub fn build(
        position: &Position,
        price: Price,
        params: &ProtocolParams,
    ) -> Result<Self, MathError> {
        let ltv_percent = ltv::ltv_bps(position.debt, position.collateral, price)?
            .and_then(|bps| i128::try_from(bps).ok())
            .and_then(|bps| Decimal::try_from_i128_with_scale(bps, 2).ok());

        Ok(Self {
            collateral: position.collateral,
            debt: position.debt,
            collateral_value: position.collateral_value(price)?,
            ltv_percent,
            max_ltv: params.max_ltv,
            liquidation_ltv: params.liquidation_ltv,
            max_debt: ltv::max_debt(position.collateral, price, params.max_ltv)?,
            borrow_capacity: ltv::borrow_capacity(
                position.collateral,
                position.debt,
                price,
                params.max_ltv,
            )?,
            max_withdrawable: ltv::max_withdrawable(
                position.collateral,
                position.debt,
                price,
                params.max_ltv,
            )?,
            liquidation_price: liquidation_price(
                position.collateral,
                position.debt,
                params.liquidation_ltv,
            )?,
            annual_interest: params.annual_interest_bps.as_fraction(),
            feed_price: price,
        })
    }
}
