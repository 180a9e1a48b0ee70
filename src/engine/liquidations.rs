//! Liquidation detection and execution.

use super::core::Engine;
use super::results::{EngineError, LiquidationResult};
use crate::events::{BadDebtEvent, EventPayload, LiquidationEvent};
use crate::liquidation::{compute_seizure, evaluate_liquidation, is_liquidatable, LiquidationStatus};
use crate::reserve::LENDING_POOL;
use crate::token::TokenLedger;
use crate::types::{AccountId, Amount, Asset};
use tracing::{info, warn};

impl Engine {
    /// False for accounts without a position.
    pub fn check_liquidatable(&self, account: AccountId) -> Result<bool, EngineError> {
        let Some(position) = self.positions.get(&account) else {
            return Ok(false);
        };
        let price = self.feed.get_price()?;
        Ok(is_liquidatable(
            position.debt,
            position.collateral,
            price,
            self.params.liquidation_ltv,
        )?)
    }

    pub fn liquidation_status(&self, account: AccountId) -> Result<Option<LiquidationStatus>, EngineError> {
        let Some(position) = self.positions.get(&account) else {
            return Ok(None);
        };
        let price = self.feed.get_price()?;
        Ok(Some(evaluate_liquidation(position, price, &self.params)?))
    }

    /// Every liquidatable account, sorted for a stable keeper order.
    pub fn liquidatable_accounts(&self) -> Result<Vec<AccountId>, EngineError> {
        let price = self.feed.get_price()?;
        let mut accounts = Vec::new();
        for (account, position) in &self.positions {
            if is_liquidatable(
                position.debt,
                position.collateral,
                price,
                self.params.liquidation_ltv,
            )? {
                accounts.push(*account);
            }
        }
        accounts.sort();
        Ok(accounts)
    }

    /// Permissionless. the liquidator pays the covered debt in stablecoin through
    /// the pool's allowance and receives the seized collateral. uncovered debt is
    /// written off and reported as `BadDebtRemaining` after the commit.
    pub fn liquidate(
        &mut self,
        account: AccountId,
        liquidator: AccountId,
    ) -> Result<LiquidationResult, EngineError> {
        self.ensure_operational()?;
        self.try_liquidate(account, liquidator)
            .map_err(|e| match e {
                // committed, logged at warn already
                EngineError::BadDebtRemaining(_) => e,
                e => self.reject("liquidate", account, e),
            })
    }

    fn try_liquidate(
        &mut self,
        account: AccountId,
        liquidator: AccountId,
    ) -> Result<LiquidationResult, EngineError> {
        self.ensure_user(liquidator)?;
        let params = self.params.clone();

        let position = self
            .positions
            .get(&account)
            .cloned()
            .ok_or(EngineError::NotLiquidatable(account))?;

        let price = self.feed.get_price()?;
        if !is_liquidatable(position.debt, position.collateral, price, params.liquidation_ltv)? {
            return Err(EngineError::NotLiquidatable(account));
        }

        let seizure = compute_seizure(
            position.debt,
            position.collateral,
            price,
            params.liquidation_penalty_bps,
        )?;
        let mut pool = self.pool.clone();
        pool.record_seizure(position.debt, &seizure)?;
        let mut next = position.clone();
        next.collateral = position
            .collateral
            .checked_sub(seizure.seized)
            .ok_or(EngineError::ArithmeticOverflow)?;
        next.debt = Amount::ZERO;
        next.updated_at = self.current_time;

        let allowance = self.stable.allowance(liquidator, LENDING_POOL);
        self.stable
            .transfer_from(LENDING_POOL, liquidator, LENDING_POOL, seizure.repaid)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            })?;

        if let Err(source) = self.gold.transfer(LENDING_POOL, liquidator, seizure.seized) {
            let undo = self.stable.transfer(LENDING_POOL, liquidator, seizure.repaid);
            self.stable.approve(liquidator, LENDING_POOL, allowance);
            if let Err(e) = undo {
                return Err(self.halt(format!("liquidation rollback failed: {e}")));
            }
            return Err(EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            });
        }

        let result = LiquidationResult {
            account_id: account,
            liquidator,
            price,
            collateral_seized: seizure.seized,
            penalty: seizure.penalty,
            debt_repaid: seizure.repaid,
            bad_debt: seizure.bad_debt,
            remaining_collateral: next.collateral,
        };
        self.positions.insert(account, next);
        self.pool = pool;

        info!(
            %account,
            %liquidator,
            %price,
            seized = %seizure.seized,
            repaid = %seizure.repaid,
            "position liquidated"
        );
        self.emit_event(EventPayload::Liquidation(LiquidationEvent {
            account_id: account,
            liquidator,
            price,
            collateral_seized: seizure.seized,
            penalty: seizure.penalty,
            debt_repaid: seizure.repaid,
        }));

        if seizure.has_bad_debt() {
            warn!(%account, bad_debt = %seizure.bad_debt, "liquidation left bad debt");
            self.emit_event(EventPayload::BadDebt(BadDebtEvent {
                account_id: account,
                bad_debt: seizure.bad_debt,
            }));
            self.check_books()?;
            return Err(EngineError::BadDebtRemaining(Box::new(result)));
        }

        self.check_books()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ProtocolParams;
    use crate::engine::{Engine, EngineConfig, EngineError, ErrorKind};
    use crate::events::EventPayload;
    use crate::liquidation::LiquidationStatus;
    use crate::reserve::{LENDING_POOL, TREASURY};
    use crate::types::{AccountId, Amount, Asset, Bps, Price, SwapDirection};

    fn units(n: u128) -> Amount {
        Amount::from_units(n).unwrap()
    }

    fn price(n: u128) -> Price {
        Price::from_units(n).unwrap()
    }

    fn borrower() -> AccountId {
        AccountId::from_seed(1)
    }

    fn keeper() -> AccountId {
        AccountId::from_seed(9)
    }

    /// Borrower has 10 gold deposited and `debt` stablecoin drawn at price 10.
    fn setup(penalty: Bps, debt: u128) -> Engine {
        let mut params = ProtocolParams::default();
        params.fee_bps = Bps::ZERO;
        params.liquidation_penalty_bps = penalty;
        let mut engine = Engine::new(params, EngineConfig::default()).unwrap();
        engine.set_price(price(10)).unwrap();
        engine.fund_treasury(units(1_000)).unwrap();
        engine.fund_lending_pool(units(1_000)).unwrap();

        engine.mint_stable(borrower(), units(100)).unwrap();
        engine.approve(Asset::Stable, borrower(), TREASURY, units(100)).unwrap();
        engine
            .swap(borrower(), SwapDirection::StableToGold, units(100))
            .unwrap();
        engine.approve(Asset::Gold, borrower(), LENDING_POOL, units(10)).unwrap();
        engine.deposit(borrower(), units(10)).unwrap();
        engine.borrow(borrower(), units(debt)).unwrap();

        engine.mint_stable(keeper(), units(1_000)).unwrap();
        engine.approve(Asset::Stable, keeper(), LENDING_POOL, units(1_000)).unwrap();
        engine
    }

    #[test]
    fn test_healthy_position_not_liquidatable() {
        let mut engine = setup(Bps::ZERO, 60);
        assert!(!engine.check_liquidatable(borrower()).unwrap());
        assert!(!engine.check_liquidatable(keeper()).unwrap());

        let err = engine.liquidate(borrower(), keeper()).unwrap_err();
        assert_eq!(err, EngineError::NotLiquidatable(borrower()));
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }

    #[test]
    fn test_liquidation_covers_debt() {
        let mut engine = setup(Bps::new(500), 60);
        // value 70, 80% of it is 56 < 60
        engine.set_price(price(7)).unwrap();
        assert!(engine.check_liquidatable(borrower()).unwrap());
        assert_eq!(engine.liquidatable_accounts().unwrap(), vec![borrower()]);
        assert!(matches!(
            engine.liquidation_status(borrower()).unwrap(),
            Some(LiquidationStatus::Liquidatable { .. })
        ));

        let result = engine.liquidate(borrower(), keeper()).unwrap();
        // 60 * 1.05 / 7 = 9
        assert_eq!(result.collateral_seized, units(9));
        assert_eq!(result.debt_repaid, units(60));
        assert_eq!(result.bad_debt, Amount::ZERO);
        assert_eq!(result.remaining_collateral, units(1));

        let position = engine.position(borrower()).unwrap();
        assert_eq!(position.debt, Amount::ZERO);
        assert_eq!(position.collateral, units(1));
        assert_eq!(engine.balance_of(Asset::Gold, keeper()), units(9));
        assert_eq!(engine.balance_of(Asset::Stable, keeper()), units(940));
        assert_eq!(engine.pool_book().total_debt, Amount::ZERO);
    }

    #[test]
    fn test_liquidation_reports_bad_debt() {
        let mut engine = setup(Bps::ZERO, 60);
        // collateral now worth 50 against 60 of debt
        engine.set_price(price(5)).unwrap();

        let err = engine.liquidate(borrower(), keeper()).unwrap_err();
        let EngineError::BadDebtRemaining(result) = &err else {
            panic!("expected bad debt, got {err:?}");
        };
        assert_eq!(result.collateral_seized, units(10));
        assert_eq!(result.debt_repaid, units(50));
        assert_eq!(result.bad_debt, units(10));
        assert!(err.is_committed());

        // state committed despite the error
        let position = engine.position(borrower()).unwrap();
        assert_eq!(position.debt, Amount::ZERO);
        assert_eq!(position.collateral, Amount::ZERO);
        assert_eq!(engine.pool_book().cumulative_bad_debt, units(10));
        assert!(engine
            .events()
            .iter()
            .any(|e| matches!(e.payload, EventPayload::BadDebt(_))));
        assert!(!engine.is_halted());
    }

    #[test]
    fn test_penalty_shrinks_before_bad_debt() {
        let mut engine = setup(Bps::new(1_000), 48);
        // value 50: covers the 48 of debt but not the 10% penalty
        engine.set_price(price(5)).unwrap();

        let result = engine.liquidate(borrower(), keeper()).unwrap();
        assert_eq!(result.collateral_seized, units(10));
        assert_eq!(result.debt_repaid, units(48));
        assert_eq!(result.bad_debt, Amount::ZERO);
        assert_eq!(result.remaining_collateral, Amount::ZERO);

        assert_eq!(engine.pool_book().cumulative_bad_debt, Amount::ZERO);
        assert_eq!(engine.balance_of(Asset::Stable, keeper()), units(952));
        assert_eq!(engine.balance_of(Asset::Gold, keeper()), units(10));
        assert!(!engine
            .events()
            .iter()
            .any(|e| matches!(e.payload, EventPayload::BadDebt(_))));
    }

    #[test]
    fn test_liquidator_must_pay() {
        let mut engine = setup(Bps::ZERO, 60);
        engine.set_price(price(7)).unwrap();
        let broke = AccountId::from_seed(3);

        let err = engine.liquidate(borrower(), broke).unwrap_err();
        assert!(matches!(err, EngineError::TransferFailed { .. }));
        assert_eq!(engine.position(borrower()).unwrap().debt, units(60));
        assert!(engine.check_liquidatable(borrower()).unwrap());
    }
}
