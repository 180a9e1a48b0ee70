// 4.0: a collateral/debt position. one per account, created on first deposit,
// never deleted. a fully unwound position just holds zero and zero.
// mutations are pure: apply_change returns the would-be post state and the caller
// decides whether to commit it.

use crate::ltv;
use crate::math::MathError;
use crate::types::{AccountId, Amount, Percent, Price, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub owner: AccountId,
    // gold-token held in lending custody
    pub collateral: Amount,
    // stablecoin owed
    pub debt: Amount,
    pub opened_at: Timestamp,
    pub updated_at: Timestamp,
    // last time interest was (nominally) accrued
    pub last_accrual: Timestamp,
}

impl Position {
    pub fn new(owner: AccountId, timestamp: Timestamp) -> Self {
        Self {
            owner,
            collateral: Amount::ZERO,
            debt: Amount::ZERO,
            opened_at: timestamp,
            updated_at: timestamp,
            last_accrual: timestamp,
        }
    }

    pub fn is_unwound(&self) -> bool {
        self.collateral.is_zero() && self.debt.is_zero()
    }

    pub fn has_debt(&self) -> bool {
        !self.debt.is_zero()
    }

    pub fn within_ltv(&self, price: Price, limit: Percent) -> Result<bool, MathError> {
        ltv::within_ltv(self.debt, self.collateral, price, limit)
    }

    pub fn collateral_value(&self, price: Price) -> Result<Amount, MathError> {
        ltv::collateral_value(self.collateral, price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionChange {
    Deposit(Amount),
    Withdraw(Amount),
    Borrow(Amount),
    Repay(Amount),
}

impl PositionChange {
    pub fn amount(&self) -> Amount {
        match self {
            PositionChange::Deposit(a)
            | PositionChange::Withdraw(a)
            | PositionChange::Borrow(a)
            | PositionChange::Repay(a) => *a,
        }
    }

    // only these two can raise LTV
    pub fn raises_ltv(&self) -> bool {
        matches!(self, PositionChange::Withdraw(_) | PositionChange::Borrow(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("withdraw {requested} exceeds collateral {available}")]
    InsufficientCollateral { requested: Amount, available: Amount },

    #[error("repay {requested} exceeds debt {outstanding}")]
    ExceedsDebt { requested: Amount, outstanding: Amount },

    #[error("position amount overflow")]
    Overflow,
}

/// Tentative post-state of `position` after `change`. no LTV check here.
pub fn apply_change(
    position: &Position,
    change: PositionChange,
    timestamp: Timestamp,
) -> Result<Position, PositionError> {
    let mut next = position.clone();
    match change {
        PositionChange::Deposit(amount) => {
            next.collateral = position
                .collateral
                .checked_add(amount)
                .ok_or(PositionError::Overflow)?;
        }
        PositionChange::Withdraw(amount) => {
            next.collateral = position.collateral.checked_sub(amount).ok_or(
                PositionError::InsufficientCollateral {
                    requested: amount,
                    available: position.collateral,
                },
            )?;
        }
        PositionChange::Borrow(amount) => {
            next.debt = position
                .debt
                .checked_add(amount)
                .ok_or(PositionError::Overflow)?;
        }
        PositionChange::Repay(amount) => {
            next.debt = position
                .debt
                .checked_sub(amount)
                .ok_or(PositionError::ExceedsDebt {
                    requested: amount,
                    outstanding: position.debt,
                })?;
        }
    }
    next.updated_at = timestamp;
    Ok(next)
}
