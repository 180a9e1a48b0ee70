// 5.0 exchange.rs: swap pricing. pure function of (direction, amount, price, fee).
// one price sample in, one quote out. the engine executes the quote's legs.
//
// stable -> gold: out = amount_in * (1 - fee) / price, gold minted to the user,
//                 all of amount_in goes to the treasury (fee stays there).
// gold -> stable: out = amount_in * price * (1 - fee), gold burned from the user,
//                 out paid by the treasury, fee is the part it keeps.
// fee is always reported in stablecoin.

use crate::math::{mul_div_floor, MathError};
use crate::types::{Amount, Bps, Price, SwapDirection, BPS_DENOMINATOR, WAD};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub direction: SwapDirection,
    pub amount_in: Amount,
    pub amount_out: Amount,
    // stablecoin retained by the treasury
    pub fee: Amount,
    pub price: Price,
    pub fee_bps: Bps,
}

impl SwapQuote {
    // stablecoin leg of the swap, before fee
    pub fn gross_stable(&self) -> Amount {
        match self.direction {
            SwapDirection::StableToGold => self.amount_in,
            SwapDirection::GoldToStable => self
                .amount_out
                .checked_add(self.fee)
                .unwrap_or(self.amount_out),
        }
    }

    pub fn gold_leg(&self) -> Amount {
        match self.direction {
            SwapDirection::StableToGold => self.amount_out,
            SwapDirection::GoldToStable => self.amount_in,
        }
    }
}

pub fn quote_swap(
    direction: SwapDirection,
    amount_in: Amount,
    price: Price,
    fee_bps: Bps,
) -> Result<SwapQuote, MathError> {
    let keep = u128::from(fee_bps.complement());
    let bps = u128::from(BPS_DENOMINATOR);

    let (amount_out, fee) = match direction {
        SwapDirection::StableToGold => {
            let out = mul_div_floor(&[amount_in.raw(), WAD, keep], &[price.raw(), bps])?;
            let fee = mul_div_floor(&[amount_in.raw(), u128::from(fee_bps.value())], &[bps])?;
            (out, fee)
        }
        SwapDirection::GoldToStable => {
            let gross = mul_div_floor(&[amount_in.raw(), price.raw()], &[WAD])?;
            let out = mul_div_floor(&[amount_in.raw(), price.raw(), keep], &[WAD, bps])?;
            (out, gross.saturating_sub(out))
        }
    };

    Ok(SwapQuote {
        direction,
        amount_in,
        amount_out: Amount::from_raw(amount_out),
        fee: Amount::from_raw(fee),
        price,
        fee_bps,
    })
}
