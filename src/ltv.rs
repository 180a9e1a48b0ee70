//! Loan-to-value math.
//!
//! LTV is debt divided by collateral value. Collateral value is collateral
//! times the feed price, both 18-decimal fixed point. Every check compares
//! cross-multiplied integers (`debt * 100 * WAD` against
//! `collateral * price * limit`) so the boundary is exact: borrowing exactly
//! the maximum succeeds and one raw unit more fails.

use crate::math::{mul_div_ceil, mul_div_floor, product_le, MathError};
use crate::types::{Amount, Percent, Price, BPS_DENOMINATOR, PERCENT_DENOMINATOR, WAD};

/// `debt <= collateral * price * limit / 100`
pub fn within_ltv(
    debt: Amount,
    collateral: Amount,
    price: Price,
    limit: Percent,
) -> Result<bool, MathError> {
    product_le(
        &[debt.raw(), u128::from(PERCENT_DENOMINATOR), WAD],
        &[collateral.raw(), price.raw(), u128::from(limit.value())],
    )
}

pub fn collateral_value(collateral: Amount, price: Price) -> Result<Amount, MathError> {
    mul_div_floor(&[collateral.raw(), price.raw()], &[WAD]).map(Amount::from_raw)
}

/// Largest debt the collateral supports at `limit`.
pub fn max_debt(collateral: Amount, price: Price, limit: Percent) -> Result<Amount, MathError> {
    mul_div_floor(
        &[collateral.raw(), price.raw(), u128::from(limit.value())],
        &[WAD, u128::from(PERCENT_DENOMINATOR)],
    )
    .map(Amount::from_raw)
}

/// Additional debt that can be drawn before hitting `limit`.
pub fn borrow_capacity(
    collateral: Amount,
    debt: Amount,
    price: Price,
    limit: Percent,
) -> Result<Amount, MathError> {
    Ok(max_debt(collateral, price, limit)?.saturating_sub(debt))
}

/// Collateral that can leave while keeping `debt` within `limit`.
pub fn max_withdrawable(
    collateral: Amount,
    debt: Amount,
    price: Price,
    limit: Percent,
) -> Result<Amount, MathError> {
    if debt.is_zero() {
        return Ok(collateral);
    }
    if limit.value() == 0 {
        return Ok(Amount::ZERO);
    }
    let required = mul_div_ceil(
        &[debt.raw(), u128::from(PERCENT_DENOMINATOR), WAD],
        &[price.raw(), u128::from(limit.value())],
    )?;
    Ok(collateral.saturating_sub(Amount::from_raw(required)))
}

/// Current LTV in basis points, `None` when there is no collateral value.
pub fn ltv_bps(debt: Amount, collateral: Amount, price: Price) -> Result<Option<u128>, MathError> {
    if collateral.is_zero() {
        return Ok(None);
    }
    mul_div_floor(
        &[debt.raw(), u128::from(BPS_DENOMINATOR), WAD],
        &[collateral.raw(), price.raw()],
    )
    .map(Some)
}
