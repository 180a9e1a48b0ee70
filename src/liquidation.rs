//! Liquidation conditions and collateral seizure.
//!
//! A position is liquidatable once `debt > collateral * price * liquidation_ltv / 100`.
//! Liquidation seizes enough collateral to cover the debt plus the configured
//! penalty. When the collateral cannot cover that, everything is seized and the
//! uncovered part of the debt is reported as bad debt instead of being absorbed.

use crate::config::ProtocolParams;
use crate::ltv;
use crate::math::{mul_div_ceil, mul_div_floor, product_le, MathError};
use crate::position::Position;
use crate::types::{Amount, Bps, Percent, Price, BPS_DENOMINATOR, PERCENT_DENOMINATOR, WAD};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidationStatus {
    /// At or under max LTV.
    Safe {
        ltv_bps: Option<u128>,
        liquidation_price: Option<Price>,
    },
    /// Above max LTV but not yet liquidatable. only reachable by price moves.
    AtRisk {
        ltv_bps: u128,
        liquidation_price: Option<Price>,
    },
    Liquidatable { ltv_bps: u128 },
    /// Collateral value is below the debt. liquidation will leave bad debt.
    Underwater { shortfall: Amount },
}

impl LiquidationStatus {
    pub fn is_liquidatable(&self) -> bool {
        matches!(
            self,
            LiquidationStatus::Liquidatable { .. } | LiquidationStatus::Underwater { .. }
        )
    }
}

pub fn is_liquidatable(
    debt: Amount,
    collateral: Amount,
    price: Price,
    liquidation_ltv: Percent,
) -> Result<bool, MathError> {
    let within = product_le(
        &[debt.raw(), u128::from(PERCENT_DENOMINATOR), WAD],
        &[collateral.raw(), price.raw(), u128::from(liquidation_ltv.value())],
    )?;
    Ok(!within)
}

/// Feed price below which the position becomes liquidatable.
/// `None` when there is nothing to liquidate or nothing backing the debt.
pub fn liquidation_price(
    collateral: Amount,
    debt: Amount,
    liquidation_ltv: Percent,
) -> Result<Option<Price>, MathError> {
    if collateral.is_zero() || debt.is_zero() || liquidation_ltv.value() == 0 {
        return Ok(None);
    }
    let raw = mul_div_ceil(
        &[debt.raw(), u128::from(PERCENT_DENOMINATOR), WAD],
        &[collateral.raw(), u128::from(liquidation_ltv.value())],
    )?;
    Ok(Price::new(raw))
}

pub fn evaluate_liquidation(
    position: &Position,
    price: Price,
    params: &ProtocolParams,
) -> Result<LiquidationStatus, MathError> {
    let liq_price = liquidation_price(position.collateral, position.debt, params.liquidation_ltv)?;
    let ltv_bps = ltv::ltv_bps(position.debt, position.collateral, price)?;

    if position.within_ltv(price, params.max_ltv)? {
        return Ok(LiquidationStatus::Safe {
            ltv_bps,
            liquidation_price: liq_price,
        });
    }

    let value = position.collateral_value(price)?;
    if value < position.debt {
        return Ok(LiquidationStatus::Underwater {
            shortfall: position.debt.saturating_sub(value),
        });
    }

    // collateral is non-zero here, otherwise value < debt above
    let ltv_bps = ltv_bps.unwrap_or(u128::MAX);
    if is_liquidatable(position.debt, position.collateral, price, params.liquidation_ltv)? {
        Ok(LiquidationStatus::Liquidatable { ltv_bps })
    } else {
        Ok(LiquidationStatus::AtRisk {
            ltv_bps,
            liquidation_price: liq_price,
        })
    }
}

/// Outcome of seizing one position. amounts in gold-token except `repaid`
/// and `bad_debt`, which are stablecoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seizure {
    pub seized: Amount,
    // part of `seized` above the debt's value, kept by the liquidator
    pub penalty: Amount,
    pub repaid: Amount,
    pub bad_debt: Amount,
}

impl Seizure {
    pub fn has_bad_debt(&self) -> bool {
        !self.bad_debt.is_zero()
    }
}

/// Seized collateral rounds up so rounding never under-covers the debt.
/// Stablecoin repaid on a clamped seizure rounds down. bad debt appears only
/// when the whole collateral is worth less than the debt.
pub fn compute_seizure(
    debt: Amount,
    collateral: Amount,
    price: Price,
    penalty: Bps,
) -> Result<Seizure, MathError> {
    let penalty_factor = u128::from(BPS_DENOMINATOR) + u128::from(penalty.value());
    let bps = u128::from(BPS_DENOMINATOR);

    let target = mul_div_ceil(&[debt.raw(), WAD, penalty_factor], &[price.raw(), bps])?;
    let debt_in_gold = mul_div_ceil(&[debt.raw(), WAD], &[price.raw()])?;

    if target <= collateral.raw() {
        return Ok(Seizure {
            seized: Amount::from_raw(target),
            penalty: Amount::from_raw(target.saturating_sub(debt_in_gold)),
            repaid: debt,
            bad_debt: Amount::ZERO,
        });
    }

    // clamp to the whole collateral. the debt is covered first, the
    // penalty only gets what is left over
    let covered = mul_div_floor(&[collateral.raw(), price.raw()], &[WAD])?;
    let repaid = Amount::from_raw(covered.min(debt.raw()));
    let repaid_in_gold = mul_div_ceil(&[repaid.raw(), WAD], &[price.raw()])?;

    Ok(Seizure {
        seized: collateral,
        penalty: Amount::from_raw(collateral.raw().saturating_sub(repaid_in_gold)),
        repaid,
        bad_debt: debt.saturating_sub(repaid),
    })
}
