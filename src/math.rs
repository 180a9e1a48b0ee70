//! 256-bit intermediate arithmetic for fixed-point products.
//!
//! Collateral (10^20 for 100 tokens) times price (10^24 for 1e6 stable per
//! token) already overflows `u128`, so every product is widened to `U256`
//! and only the final quotient is narrowed back.

use alloy_primitives::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,
}

fn product(factors: &[u128]) -> Result<U256, MathError> {
    factors.iter().try_fold(U256::from(1u8), |acc, f| {
        acc.checked_mul(U256::from(*f)).ok_or(MathError::Overflow)
    })
}

fn narrow(value: U256) -> Result<u128, MathError> {
    u128::try_from(value).map_err(|_| MathError::Overflow)
}

/// floor(product(numer) / product(denom))
pub fn mul_div_floor(numer: &[u128], denom: &[u128]) -> Result<u128, MathError> {
    let n = product(numer)?;
    let d = product(denom)?;
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    narrow(n / d)
}

/// ceil(product(numer) / product(denom))
pub fn mul_div_ceil(numer: &[u128], denom: &[u128]) -> Result<u128, MathError> {
    let n = product(numer)?;
    let d = product(denom)?;
    if d.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let q = n / d;
    let q = if (n % d).is_zero() { q } else { q + U256::from(1u8) };
    narrow(q)
}

/// product(lhs) <= product(rhs), compared without any division so no rounding
/// can tip a boundary case either way.
pub fn product_le(lhs: &[u128], rhs: &[u128]) -> Result<bool, MathError> {
    Ok(product(lhs)? <= product(rhs)?)
}
