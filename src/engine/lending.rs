//! Position ledger operations: deposit, withdraw, borrow, repay.
//!
//! Each call builds the would-be position with `apply_change`, checks it,
//! and only then moves tokens and commits. Withdraw and borrow are the only
//! operations that can raise LTV, so only they sample the feed price.

use super::core::Engine;
use super::results::EngineError;
use crate::config::ProtocolParams;
use crate::events::{CollateralEvent, DebtEvent, EventPayload};
use crate::interest;
use crate::position::{apply_change, Position, PositionChange};
use crate::quote::LoanSummary;
use crate::reserve::{PoolBook, LENDING_POOL};
use crate::token::TokenLedger;
use crate::types::{AccountId, Amount, Asset};
use tracing::info;

impl Engine {
    /// Move gold-token into pool custody. returns the new collateral.
    pub fn deposit(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_operational()?;
        self.try_deposit(account, amount)
            .map_err(|e| self.reject("deposit", account, e))
    }

    /// Return gold-token from custody if the position stays within max LTV.
    pub fn withdraw(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_operational()?;
        self.try_withdraw(account, amount)
            .map_err(|e| self.reject("withdraw", account, e))
    }

    /// Draw stablecoin from the pool against collateral. returns the new debt.
    pub fn borrow(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_operational()?;
        self.try_borrow(account, amount)
            .map_err(|e| self.reject("borrow", account, e))
    }

    /// Pay stablecoin back to the pool. returns the new debt.
    pub fn repay(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_operational()?;
        self.try_repay(account, amount)
            .map_err(|e| self.reject("repay", account, e))
    }

    /// Loan page figures for `account` at the current feed price.
    pub fn loan_summary(&self, account: AccountId) -> Result<LoanSummary, EngineError> {
        let price = self.feed.get_price()?;
        let position = self
            .positions
            .get(&account)
            .cloned()
            .unwrap_or_else(|| Position::new(account, self.current_time));
        Ok(LoanSummary::build(&position, price, &self.params)?)
    }

    fn try_deposit(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount, "deposit amount must be positive")?;
        let params = self.params.clone();

        let current = self
            .positions
            .get(&account)
            .cloned()
            .unwrap_or_else(|| Position::new(account, self.current_time));
        let mut pool = self.pool.clone();
        let next = self.prepare(&current, PositionChange::Deposit(amount), &params, &mut pool)?;
        pool.add_collateral(amount)?;

        self.gold
            .transfer_from(LENDING_POOL, account, LENDING_POOL, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            })?;

        let collateral = next.collateral;
        self.commit_position(next, pool);
        info!(%account, %amount, %collateral, "collateral deposited");
        self.emit_event(EventPayload::Deposit(CollateralEvent {
            account_id: account,
            amount,
            new_collateral: collateral,
        }));
        self.check_books()?;
        Ok(collateral)
    }

    fn try_withdraw(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount, "withdraw amount must be positive")?;
        let params = self.params.clone();

        let current = self
            .positions
            .get(&account)
            .cloned()
            .ok_or(EngineError::InsufficientCollateral {
                available: Amount::ZERO,
                requested: amount,
            })?;
        let mut pool = self.pool.clone();
        let next = self.prepare(&current, PositionChange::Withdraw(amount), &params, &mut pool)?;
        self.check_max_ltv(&next, &params)?;
        pool.remove_collateral(amount)?;

        self.gold
            .transfer(LENDING_POOL, account, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            })?;

        let collateral = next.collateral;
        self.commit_position(next, pool);
        info!(%account, %amount, %collateral, "collateral withdrawn");
        self.emit_event(EventPayload::Withdrawal(CollateralEvent {
            account_id: account,
            amount,
            new_collateral: collateral,
        }));
        self.check_books()?;
        Ok(collateral)
    }

    fn try_borrow(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount, "borrow amount must be positive")?;
        let params = self.params.clone();

        let current = self
            .positions
            .get(&account)
            .cloned()
            .unwrap_or_else(|| Position::new(account, self.current_time));
        let mut pool = self.pool.clone();
        let next = self.prepare(&current, PositionChange::Borrow(amount), &params, &mut pool)?;
        // LTV first: a request the collateral can never back is not retryable
        self.check_max_ltv(&next, &params)?;

        let available = self.stable.balance_of(LENDING_POOL);
        if available < amount {
            return Err(EngineError::InsufficientLiquidity {
                available,
                requested: amount,
            });
        }
        pool.add_debt(amount)?;

        self.stable
            .transfer(LENDING_POOL, account, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            })?;

        let debt = next.debt;
        self.commit_position(next, pool);
        info!(%account, %amount, %debt, "loan drawn");
        self.emit_event(EventPayload::Borrow(DebtEvent {
            account_id: account,
            amount,
            new_debt: debt,
        }));
        self.check_books()?;
        Ok(debt)
    }

    fn try_repay(&mut self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount, "repay amount must be positive")?;
        let params = self.params.clone();

        let current = self
            .positions
            .get(&account)
            .cloned()
            .ok_or(EngineError::ExceedsDebt {
                outstanding: Amount::ZERO,
                requested: amount,
            })?;
        let mut pool = self.pool.clone();
        let next = self.prepare(&current, PositionChange::Repay(amount), &params, &mut pool)?;
        pool.remove_debt(amount)?;

        self.stable
            .transfer_from(LENDING_POOL, account, LENDING_POOL, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            })?;

        let debt = next.debt;
        self.commit_position(next, pool);
        info!(%account, %amount, %debt, "loan repaid");
        self.emit_event(EventPayload::Repay(DebtEvent {
            account_id: account,
            amount,
            new_debt: debt,
        }));
        self.check_books()?;
        Ok(debt)
    }

    // accrue, then apply the change. nothing is written to self.
    fn prepare(
        &self,
        current: &Position,
        change: PositionChange,
        params: &ProtocolParams,
        pool: &mut PoolBook,
    ) -> Result<Position, EngineError> {
        let mut accrued = current.clone();
        let interest = interest::accrue(&mut accrued, params, self.current_time);
        if !interest.is_zero() {
            accrued.debt = accrued
                .debt
                .checked_add(interest)
                .ok_or(EngineError::ArithmeticOverflow)?;
            pool.add_debt(interest)?;
        }
        Ok(apply_change(&accrued, change, self.current_time)?)
    }

    // one feed sample for the whole check
    fn check_max_ltv(&self, next: &Position, params: &ProtocolParams) -> Result<(), EngineError> {
        let price = self.feed.get_price()?;
        if next.within_ltv(price, params.max_ltv)? {
            return Ok(());
        }
        Err(EngineError::ExceedsMaxLTV {
            debt: next.debt,
            collateral: next.collateral,
            price,
            max_ltv: params.max_ltv,
        })
    }

    fn commit_position(&mut self, position: Position, pool: PoolBook) {
        self.positions.insert(position.owner, position);
        self.pool = pool;
    }
}
