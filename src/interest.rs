// 4.1 interest.rs: nominal interest only. the annual rate is shown on the loan page
// but no accrual schedule exists, so accrual is a zero stub. callers still go
// through accrue() so a real schedule can drop in without touching the ledger.

use crate::config::ProtocolParams;
use crate::position::Position;
use crate::types::{Amount, Timestamp};
use rust_decimal::Decimal;

pub const MILLIS_PER_YEAR: i64 = 365 * 24 * 60 * 60 * 1000;

/// Nominal annual rate as a fraction, e.g. 0.045.
pub fn annual_rate(params: &ProtocolParams) -> Decimal {
    params.annual_interest_bps.as_fraction()
}

/// Interest owed on `debt` over `elapsed_ms`. always zero.
pub fn accrued_interest(_debt: Amount, _params: &ProtocolParams, _elapsed_ms: i64) -> Amount {
    Amount::ZERO
}

/// Bring a position's interest up to `now`. returns the interest added.
pub fn accrue(position: &mut Position, params: &ProtocolParams, now: Timestamp) -> Amount {
    let elapsed = position.last_accrual.elapsed_millis(&now);
    let interest = accrued_interest(position.debt, params, elapsed);
    position.last_accrual = now;
    interest
}
