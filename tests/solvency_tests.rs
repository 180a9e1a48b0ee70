//! Solvency invariant tests.
//!
//! These tests verify the accounting invariants that must hold for the
//! protocol to remain solvent under any sequence of operations.

use emasx_core::*;
use proptest::prelude::*;

const USERS: u8 = 4;

fn units(n: u128) -> Amount {
    Amount::from_units(n).unwrap()
}

fn share(amount: Amount, percent: u8) -> Amount {
    Amount::from_raw(amount.raw() / 100 * u128::from(percent))
}

fn keeper() -> AccountId {
    AccountId::from_seed(99)
}

#[derive(Debug, Clone)]
enum Op {
    Buy(u8, u32),
    Sell(u8, u8),
    Deposit(u8, u8),
    Withdraw(u8, u8),
    Borrow(u8, u8),
    Repay(u8, u8),
    MovePrice(u32),
    Liquidate(u8),
    Claim(u8, u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let user = 1..=USERS;
    let pct = 1u8..=100u8;
    prop_oneof![
        (user.clone(), 1u32..50_000u32).prop_map(|(u, n)| Op::Buy(u, n)),
        (user.clone(), pct.clone()).prop_map(|(u, p)| Op::Sell(u, p)),
        (user.clone(), pct.clone()).prop_map(|(u, p)| Op::Deposit(u, p)),
        (user.clone(), pct.clone()).prop_map(|(u, p)| Op::Withdraw(u, p)),
        (user.clone(), pct.clone()).prop_map(|(u, p)| Op::Borrow(u, p)),
        (user.clone(), pct.clone()).prop_map(|(u, p)| Op::Repay(u, p)),
        // 50% to 150% of the current price
        (500u32..1_500u32).prop_map(Op::MovePrice),
        user.clone().prop_map(Op::Liquidate),
        (user, pct).prop_map(|(u, p)| Op::Claim(u, p)),
    ]
}

fn setup() -> Engine {
    let mut engine = Engine::new(ProtocolParams::default(), EngineConfig::default()).unwrap();
    engine.set_price(Price::from_units(1_000).unwrap()).unwrap();
    engine.fund_treasury(units(1_000_000_000)).unwrap();
    engine.fund_lending_pool(units(1_000_000_000)).unwrap();
    for seed in 1..=USERS {
        engine.mint_stable(AccountId::from_seed(seed), units(1_000_000)).unwrap();
    }
    engine.mint_stable(keeper(), units(1_000_000_000)).unwrap();
    engine
        .approve(Asset::Stable, keeper(), LENDING_POOL, units(1_000_000_000))
        .unwrap();
    engine
}

/// Runs one operation. returns the account whose LTV it may have raised.
fn apply(engine: &mut Engine, op: &Op) -> Option<AccountId> {
    match *op {
        Op::Buy(u, n) => {
            let account = AccountId::from_seed(u);
            let amount = units(u128::from(n));
            engine.approve(Asset::Stable, account, TREASURY, amount).unwrap();
            let _ = engine.swap(account, SwapDirection::StableToGold, amount);
            None
        }
        Op::Sell(u, p) => {
            let account = AccountId::from_seed(u);
            let amount = share(engine.balance_of(Asset::Gold, account), p);
            let _ = engine.swap(account, SwapDirection::GoldToStable, amount);
            None
        }
        Op::Deposit(u, p) => {
            let account = AccountId::from_seed(u);
            let amount = share(engine.balance_of(Asset::Gold, account), p);
            engine.approve(Asset::Gold, account, LENDING_POOL, amount).unwrap();
            let _ = engine.deposit(account, amount);
            None
        }
        Op::Withdraw(u, p) => {
            let account = AccountId::from_seed(u);
            let collateral = engine.position(account).map(|pos| pos.collateral)?;
            engine.withdraw(account, share(collateral, p)).ok().map(|_| account)
        }
        Op::Borrow(u, p) => {
            let account = AccountId::from_seed(u);
            let capacity = engine.loan_summary(account).ok()?.borrow_capacity;
            // over 100% of capacity must be rejected, not accepted
            let amount = share(capacity, p).checked_add(share(capacity, p / 2))?;
            engine.borrow(account, amount).ok().map(|_| account)
        }
        Op::Repay(u, p) => {
            let account = AccountId::from_seed(u);
            let debt = engine.position(account).map(|pos| pos.debt)?;
            let amount = share(debt, p);
            engine.approve(Asset::Stable, account, LENDING_POOL, amount).unwrap();
            let _ = engine.repay(account, amount);
            None
        }
        Op::MovePrice(permille) => {
            let current = engine.get_price().unwrap();
            if let Some(next) = Price::new(current.raw() / 1_000 * u128::from(permille)) {
                engine.set_price(next).unwrap();
            }
            None
        }
        Op::Liquidate(u) => {
            let _ = engine.liquidate(AccountId::from_seed(u), keeper());
            None
        }
        Op::Claim(u, p) => {
            let account = AccountId::from_seed(u);
            let amount = share(engine.free_gold_balance(account), p);
            let _ = engine.claim(account, amount);
            None
        }
    }
}

proptest! {
    /// Books balance after every operation: collateral equals pool custody,
    /// debt equals the pool book and every token's balances sum to its supply.
    #[test]
    fn books_always_balance(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut engine = setup();
        for op in &ops {
            apply(&mut engine, op);
            prop_assert!(engine.audit().is_ok(), "audit failed after {:?}: {:?}", op, engine.audit());
            prop_assert!(!engine.is_halted());
        }
    }

    /// A successful borrow or withdraw always leaves the position within max LTV
    #[test]
    fn user_ops_respect_max_ltv(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut engine = setup();
        let max_ltv = engine.params().max_ltv;
        for op in &ops {
            if let Some(account) = apply(&mut engine, op) {
                let price = engine.get_price().unwrap();
                let position = engine.position(account).unwrap();
                prop_assert!(
                    position.within_ltv(price, max_ltv).unwrap(),
                    "{:?} left {:?} above max LTV at {}", op, position, price
                );
            }
        }
    }

    /// Liquidation always clears the debt, and bad debt never exceeds what was owed
    #[test]
    fn liquidation_clears_debt(
        ops in proptest::collection::vec(op_strategy(), 1..40),
        crash in 100u32..900u32,
    ) {
        let mut engine = setup();
        for op in &ops {
            apply(&mut engine, op);
        }
        apply(&mut engine, &Op::MovePrice(crash));

        for account in engine.liquidatable_accounts().unwrap() {
            let owed = engine.position(account).unwrap().debt;
            let bad_debt = match engine.liquidate(account, keeper()) {
                Ok(result) => result.bad_debt,
                Err(EngineError::BadDebtRemaining(result)) => result.bad_debt,
                Err(e) => return Err(TestCaseError::fail(format!("liquidation failed: {e}"))),
            };
            prop_assert!(bad_debt <= owed);
            prop_assert_eq!(engine.position(account).unwrap().debt, Amount::ZERO);
        }
        prop_assert!(engine.liquidatable_accounts().unwrap().is_empty());
        prop_assert!(engine.audit().is_ok());
    }

    /// Gold-token supply only moves through swaps and claims
    #[test]
    fn gold_supply_tracks_treasury_and_claims(ops in proptest::collection::vec(op_strategy(), 1..60)) {
        let mut engine = setup();
        for op in &ops {
            apply(&mut engine, op);
        }
        let issued = engine.treasury_book().net_gold_issued();
        let redeemed: u128 = engine.pending_redemptions().iter().map(|r| r.amount.raw()).sum();
        prop_assert_eq!(
            engine.total_supply(Asset::Gold).raw() + redeemed,
            issued.raw()
        );
    }
}

/// Non-proptest solvency tests.
#[cfg(test)]
mod edge_cases {
    use super::*;

    #[test]
    fn pool_liquidity_caps_total_debt() {
        let mut engine = Engine::new(ProtocolParams::default(), EngineConfig::default()).unwrap();
        engine.set_price(Price::from_units(1_000).unwrap()).unwrap();
        engine.fund_lending_pool(units(500)).unwrap();
        let alice = AccountId::from_seed(1);
        engine.mint_stable(alice, units(10_000)).unwrap();
        engine.approve(Asset::Stable, alice, TREASURY, units(10_000)).unwrap();
        let gold = engine
            .swap(alice, SwapDirection::StableToGold, units(10_000))
            .unwrap()
            .amount_out;
        engine.approve(Asset::Gold, alice, LENDING_POOL, gold).unwrap();
        engine.deposit(alice, gold).unwrap();

        let err = engine.borrow(alice, units(501)).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientLiquidity { .. }));
        engine.borrow(alice, units(500)).unwrap();
        assert_eq!(engine.pool_liquidity(), Amount::ZERO);
        assert!(engine.audit().is_ok());
    }

    #[test]
    fn rejected_operations_leave_no_trace() {
        let mut engine = setup();
        let alice = AccountId::from_seed(1);
        let events_before = engine.events().len();

        assert!(engine.withdraw(alice, units(1)).is_err());
        assert!(engine.borrow(alice, units(1)).is_err());
        assert!(engine.repay(alice, units(1)).is_err());
        assert!(engine.claim(alice, units(1)).is_err());
        assert!(engine.swap(alice, SwapDirection::GoldToStable, units(1)).is_err());

        assert_eq!(engine.events().len(), events_before);
        assert!(engine.position(alice).is_none());
        assert_eq!(engine.balance_of(Asset::Stable, alice), units(1_000_000));
    }
}
