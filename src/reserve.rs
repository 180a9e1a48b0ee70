// 10.0 reserve.rs: books for the two protocol reserves. the balances themselves live
// in the token ledgers under the custody addresses below. these books carry the
// running totals the audit and the simulation report read.

use crate::exchange::SwapQuote;
use crate::liquidation::Seizure;
use crate::math::MathError;
use crate::types::{AccountId, Amount, SwapDirection};
use serde::{Deserialize, Serialize};

/// Exchange treasury. receives stablecoin on buys, pays it out on sells.
pub const TREASURY: AccountId = AccountId::protocol(1);
/// Lending pool. holds collateral custody and loanable stablecoin.
pub const LENDING_POOL: AccountId = AccountId::protocol(2);
/// Burns gold-token against physical delivery.
pub const REDEMPTION_REGISTRY: AccountId = AccountId::protocol(3);
/// Stablecoin faucet for bootstrap and simulations.
pub const GOVERNANCE: AccountId = AccountId::protocol(4);

pub fn is_protocol_account(account: AccountId) -> bool {
    [TREASURY, LENDING_POOL, REDEMPTION_REGISTRY, GOVERNANCE].contains(&account)
}

fn add(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

fn sub(a: Amount, b: Amount) -> Result<Amount, MathError> {
    a.checked_sub(b).ok_or(MathError::Overflow)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryBook {
    pub funded: Amount,
    pub fees_collected: Amount,
    pub stable_in: Amount,
    pub stable_out: Amount,
    pub gold_minted: Amount,
    pub gold_burned: Amount,
    pub swap_count: u64,
}

impl TreasuryBook {
    pub fn record_funding(&mut self, amount: Amount) -> Result<(), MathError> {
        self.funded = add(self.funded, amount)?;
        Ok(())
    }

    // validates first, writes after, so an overflow leaves the book untouched
    pub fn record_swap(&mut self, quote: &SwapQuote) -> Result<(), MathError> {
        let mut next = self.clone();
        next.fees_collected = add(next.fees_collected, quote.fee)?;
        match quote.direction {
            SwapDirection::StableToGold => {
                next.stable_in = add(next.stable_in, quote.amount_in)?;
                next.gold_minted = add(next.gold_minted, quote.amount_out)?;
            }
            SwapDirection::GoldToStable => {
                next.stable_out = add(next.stable_out, quote.amount_out)?;
                next.gold_burned = add(next.gold_burned, quote.amount_in)?;
            }
        }
        next.swap_count += 1;
        *self = next;
        Ok(())
    }

    /// Net gold-token outstanding from the exchange.
    pub fn net_gold_issued(&self) -> Amount {
        self.gold_minted.saturating_sub(self.gold_burned)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolBook {
    pub funded: Amount,
    pub total_collateral: Amount,
    pub total_debt: Amount,
    pub cumulative_seized: Amount,
    pub cumulative_bad_debt: Amount,
    pub liquidation_count: u64,
}

impl PoolBook {
    pub fn record_funding(&mut self, amount: Amount) -> Result<(), MathError> {
        self.funded = add(self.funded, amount)?;
        Ok(())
    }

    pub fn add_collateral(&mut self, amount: Amount) -> Result<(), MathError> {
        self.total_collateral = add(self.total_collateral, amount)?;
        Ok(())
    }

    pub fn remove_collateral(&mut self, amount: Amount) -> Result<(), MathError> {
        self.total_collateral = sub(self.total_collateral, amount)?;
        Ok(())
    }

    pub fn add_debt(&mut self, amount: Amount) -> Result<(), MathError> {
        self.total_debt = add(self.total_debt, amount)?;
        Ok(())
    }

    pub fn remove_debt(&mut self, amount: Amount) -> Result<(), MathError> {
        self.total_debt = sub(self.total_debt, amount)?;
        Ok(())
    }

    /// The whole debt leaves the books: `repaid` by the liquidator, the rest as bad debt.
    pub fn record_seizure(&mut self, debt: Amount, seizure: &Seizure) -> Result<(), MathError> {
        let mut next = self.clone();
        next.total_collateral = sub(next.total_collateral, seizure.seized)?;
        next.total_debt = sub(next.total_debt, debt)?;
        next.cumulative_seized = add(next.cumulative_seized, seizure.seized)?;
        next.cumulative_bad_debt = add(next.cumulative_bad_debt, seizure.bad_debt)?;
        next.liquidation_count += 1;
        *self = next;
        Ok(())
    }
}
