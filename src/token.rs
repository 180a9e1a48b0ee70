// 2.0 token.rs: the asset capability the engine depends on. mint, burn, transfer.
// MOCKED: just balance maps, no chain. the engine only talks to the TokenLedger trait
// so a real ledger client can stand in for InMemoryToken.

use crate::types::{AccountId, Amount};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Minter,
    Burner,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{account} balance {available} is below {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error("{spender} allowance {available} from {owner} is below {requested}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        available: Amount,
        requested: Amount,
    },

    #[error("{account} is missing role {role:?}")]
    MissingRole { account: AccountId, role: Role },

    #[error("supply overflow")]
    SupplyOverflow,
}

/// 2.1: ERC-20 style ledger surface.
pub trait TokenLedger {
    fn symbol(&self) -> &str;

    fn balance_of(&self, account: AccountId) -> Amount;

    fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount;

    fn total_supply(&self) -> Amount;

    fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount);

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), TokenError>;

    /// Spender moves `amount` out of `owner` up to the granted allowance.
    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError>;

    fn mint(&mut self, caller: AccountId, to: AccountId, amount: Amount) -> Result<(), TokenError>;

    fn burn(&mut self, caller: AccountId, from: AccountId, amount: Amount) -> Result<(), TokenError>;
}

#[derive(Debug, Clone)]
pub struct InMemoryToken {
    symbol: String,
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    roles: HashMap<Role, HashSet<AccountId>>,
    total_supply: Amount,
}

impl InMemoryToken {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            roles: HashMap::new(),
            total_supply: Amount::ZERO,
        }
    }

    pub fn grant_role(&mut self, role: Role, account: AccountId) {
        self.roles.entry(role).or_default().insert(account);
    }

    pub fn revoke_role(&mut self, role: Role, account: AccountId) {
        if let Some(holders) = self.roles.get_mut(&role) {
            holders.remove(&account);
        }
    }

    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.roles
            .get(&role)
            .is_some_and(|holders| holders.contains(&account))
    }

    /// Sum of every balance. equals total_supply unless the books are broken.
    pub fn sum_of_balances(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::ZERO, |acc, b| acc.checked_add(*b))
    }

    fn require_role(&self, role: Role, account: AccountId) -> Result<(), TokenError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            Err(TokenError::MissingRole { account, role })
        }
    }

    fn require_balance(&self, account: AccountId, amount: Amount) -> Result<(), TokenError> {
        let available = self.balance_of(account);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account,
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    fn set_balance(&mut self, account: AccountId, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.require_balance(from, amount)?;
        if from == to {
            return Ok(());
        }
        let from_balance = self.balance_of(from).saturating_sub(amount);
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        self.set_balance(from, from_balance);
        self.set_balance(to, to_balance);
        Ok(())
    }
}

impl TokenLedger for InMemoryToken {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or(Amount::ZERO)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> Amount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn total_supply(&self) -> Amount {
        self.total_supply
    }

    fn approve(&mut self, owner: AccountId, spender: AccountId, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.move_balance(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        owner: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.allowance(owner, spender);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                owner,
                spender,
                available,
                requested: amount,
            });
        }
        self.move_balance(owner, to, amount)?;
        self.approve(owner, spender, available.saturating_sub(amount));
        Ok(())
    }

    fn mint(&mut self, caller: AccountId, to: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.require_role(Role::Minter, caller)?;
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        self.total_supply = supply;
        self.set_balance(to, balance);
        Ok(())
    }

    fn burn(&mut self, caller: AccountId, from: AccountId, amount: Amount) -> Result<(), TokenError> {
        self.require_role(Role::Burner, caller)?;
        self.require_balance(from, amount)?;
        self.set_balance(from, self.balance_of(from).saturating_sub(amount));
        self.total_supply = self.total_supply.saturating_sub(amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: u128) -> Amount {
        Amount::from_units(n).unwrap()
    }

    fn minted_token() -> (InMemoryToken, AccountId, AccountId) {
        let minter = AccountId::protocol(9);
        let alice = AccountId::from_seed(1);
        let mut token = InMemoryToken::new("EMASX");
        token.grant_role(Role::Minter, minter);
        token.mint(minter, alice, units(100)).unwrap();
        (token, minter, alice)
    }

    #[test]
    fn mint_requires_role() {
        let mut token = InMemoryToken::new("EMASX");
        let alice = AccountId::from_seed(1);
        let err = token.mint(alice, alice, units(1)).unwrap_err();
        assert!(matches!(err, TokenError::MissingRole { role: Role::Minter, .. }));
        assert_eq!(token.total_supply(), Amount::ZERO);
    }

    #[test]
    fn transfer_moves_balance() {
        let (mut token, _, alice) = minted_token();
        let bob = AccountId::from_seed(2);

        token.transfer(alice, bob, units(40)).unwrap();
        assert_eq!(token.balance_of(alice), units(60));
        assert_eq!(token.balance_of(bob), units(40));
        assert_eq!(token.sum_of_balances(), Some(token.total_supply()));
    }

    #[test]
    fn transfer_insufficient_balance() {
        let (mut token, _, alice) = minted_token();
        let bob = AccountId::from_seed(2);
        let err = token.transfer(alice, bob, units(101)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        assert_eq!(token.balance_of(alice), units(100));
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let (mut token, _, alice) = minted_token();
        let pool = AccountId::protocol(2);

        let err = token.transfer_from(pool, alice, pool, units(10)).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));

        token.approve(alice, pool, units(25));
        token.transfer_from(pool, alice, pool, units(10)).unwrap();
        assert_eq!(token.allowance(alice, pool), units(15));
        assert_eq!(token.balance_of(pool), units(10));
    }

    #[test]
    fn burn_reduces_supply() {
        let (mut token, _, alice) = minted_token();
        let registry = AccountId::protocol(3);

        assert!(token.burn(registry, alice, units(5)).is_err());

        token.grant_role(Role::Burner, registry);
        token.burn(registry, alice, units(5)).unwrap();
        assert_eq!(token.total_supply(), units(95));
        assert_eq!(token.balance_of(alice), units(95));

        token.revoke_role(Role::Burner, registry);
        assert!(!token.has_role(Role::Burner, registry));
    }
}
