// 8.0 engine/core.rs: main engine. holds the feed, both token ledgers, positions,
// reserve books and redemptions. bootstrap, balances, events and the book audit.

use super::config::EngineConfig;
use super::history::TradeRecord;
use super::results::EngineError;
use crate::config::{AppConfig, ProtocolParams};
use crate::events::{Event, EventEmitter, EventId, EventPayload, StoreCorruptedEvent};
use crate::position::Position;
use crate::price_feed::PriceFeed;
use crate::redemption::RedemptionRegistry;
use crate::reserve::{
    is_protocol_account, PoolBook, TreasuryBook, GOVERNANCE, LENDING_POOL, REDEMPTION_REGISTRY,
    TREASURY,
};
use crate::token::{InMemoryToken, Role, TokenLedger};
use crate::types::{AccountId, Amount, Asset, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use tracing::{debug, error, info};

/** 8.1: main engine struct. all state lives here */
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) params: ProtocolParams,
    pub(super) feed: PriceFeed,
    pub(super) stable: InMemoryToken,
    pub(super) gold: InMemoryToken,
    pub(super) positions: HashMap<AccountId, Position>,
    pub(super) treasury: TreasuryBook,
    pub(super) pool: PoolBook,
    pub(super) redemptions: RedemptionRegistry,
    pub(super) trades: VecDeque<TradeRecord>,
    pub(super) next_trade_id: u64,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) observers: Vec<Box<dyn EventEmitter + Send>>,
    pub(super) halted: Option<String>,
    pub(super) current_time: Timestamp,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("params", &self.params)
            .field("feed_round", &self.feed.round())
            .field("positions", &self.positions.len())
            .field("treasury", &self.treasury)
            .field("pool", &self.pool)
            .field("events", &self.events.len())
            .field("observers", &self.observers.len())
            .field("halted", &self.halted)
            .field("current_time", &self.current_time)
            .finish()
    }
}

impl Engine {
    /// Fresh engine with empty ledgers and the custody roles granted.
    pub fn new(params: ProtocolParams, config: EngineConfig) -> Result<Self, EngineError> {
        params.validate()?;

        let mut stable = InMemoryToken::new(Asset::Stable.symbol());
        stable.grant_role(Role::Minter, GOVERNANCE);

        // the exchange (treasury) mints and burns on swaps; the pool and the
        // registry only burn
        let mut gold = InMemoryToken::new(Asset::Gold.symbol());
        gold.grant_role(Role::Minter, TREASURY);
        gold.grant_role(Role::Burner, TREASURY);
        gold.grant_role(Role::Burner, LENDING_POOL);
        gold.grant_role(Role::Burner, REDEMPTION_REGISTRY);

        Ok(Self {
            config,
            params,
            feed: PriceFeed::new(),
            stable,
            gold,
            positions: HashMap::new(),
            treasury: TreasuryBook::default(),
            pool: PoolBook::default(),
            redemptions: RedemptionRegistry::new(),
            trades: VecDeque::new(),
            next_trade_id: 1,
            events: Vec::new(),
            next_event_id: 1,
            observers: Vec::new(),
            halted: None,
            current_time: Timestamp::from_millis(0),
        })
    }

    /// Engine from an application config: price set, treasury and pool funded.
    pub fn bootstrap(app: &AppConfig) -> Result<Self, EngineError> {
        let mut engine = Self::new(app.protocol_params(), app.engine.clone())?;
        engine.set_price(app.bootstrap.initial_price()?)?;
        engine.fund_treasury(app.bootstrap.treasury_funding()?)?;
        engine.fund_lending_pool(app.bootstrap.pool_funding()?)?;
        info!(
            environment = ?app.environment,
            price = %app.bootstrap.initial_price_units,
            "engine bootstrapped"
        );
        Ok(engine)
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- balances ----

    pub(super) fn ledger(&self, asset: Asset) -> &InMemoryToken {
        match asset {
            Asset::Stable => &self.stable,
            Asset::Gold => &self.gold,
        }
    }

    pub(super) fn ledger_mut(&mut self, asset: Asset) -> &mut InMemoryToken {
        match asset {
            Asset::Stable => &mut self.stable,
            Asset::Gold => &mut self.gold,
        }
    }

    pub fn balance_of(&self, asset: Asset, account: AccountId) -> Amount {
        self.ledger(asset).balance_of(account)
    }

    pub fn allowance(&self, asset: Asset, owner: AccountId, spender: AccountId) -> Amount {
        self.ledger(asset).allowance(owner, spender)
    }

    pub fn total_supply(&self, asset: Asset) -> Amount {
        self.ledger(asset).total_supply()
    }

    /// Stablecoin the exchange can pay out.
    pub fn treasury_reserve(&self) -> Amount {
        self.stable.balance_of(TREASURY)
    }

    /// Stablecoin the pool can lend.
    pub fn pool_liquidity(&self) -> Amount {
        self.stable.balance_of(LENDING_POOL)
    }

    pub fn treasury_book(&self) -> &TreasuryBook {
        &self.treasury
    }

    pub fn pool_book(&self) -> &PoolBook {
        &self.pool
    }

    /// Owner lets a custody account pull `amount` of `asset`: the treasury for
    /// swaps, the lending pool for deposits, repayments and liquidations.
    pub fn approve(
        &mut self,
        asset: Asset,
        owner: AccountId,
        spender: AccountId,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.ensure_operational()?;
        self.ensure_user(owner)?;
        self.ledger_mut(asset).approve(owner, spender, amount);
        debug!(%asset, %owner, %spender, %amount, "approval set");
        Ok(())
    }

    /// Wallet to wallet transfer. custody accounts are only reachable through
    /// engine operations so the books stay balanced.
    pub fn transfer(
        &mut self,
        asset: Asset,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<(), EngineError> {
        self.ensure_operational()?;
        self.ensure_user(from)?;
        self.ensure_user(to)?;
        self.ledger_mut(asset)
            .transfer(from, to, amount)
            .map_err(|source| EngineError::TransferFailed { asset, source })?;
        debug!(%asset, %from, %to, %amount, "transfer");
        Ok(())
    }

    /// Governance faucet. simulations and tests use it to hand out stablecoin.
    pub fn mint_stable(&mut self, to: AccountId, amount: Amount) -> Result<(), EngineError> {
        self.ensure_operational()?;
        self.ensure_user(to)?;
        self.mint_stable_to(to, amount)?;
        self.check_books()
    }

    pub fn fund_treasury(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.ensure_operational()?;
        let mut book = self.treasury.clone();
        book.record_funding(amount)?;
        self.mint_stable_to(TREASURY, amount)?;
        self.treasury = book;
        info!(%amount, reserve = %self.treasury_reserve(), "treasury funded");
        self.check_books()
    }

    pub fn fund_lending_pool(&mut self, amount: Amount) -> Result<(), EngineError> {
        self.ensure_operational()?;
        let mut book = self.pool.clone();
        book.record_funding(amount)?;
        self.mint_stable_to(LENDING_POOL, amount)?;
        self.pool = book;
        info!(%amount, liquidity = %self.pool_liquidity(), "lending pool funded");
        self.check_books()
    }

    fn mint_stable_to(&mut self, to: AccountId, amount: Amount) -> Result<(), EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount("mint amount must be positive"));
        }
        self.stable
            .mint(GOVERNANCE, to, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            })
    }

    // ---- positions ----

    pub fn position(&self, account_id: AccountId) -> Option<&Position> {
        self.positions.get(&account_id)
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    // ---- guards ----

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub(super) fn ensure_operational(&self) -> Result<(), EngineError> {
        match &self.halted {
            Some(reason) => Err(EngineError::StoreCorrupted {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    pub(super) fn ensure_user(&self, account: AccountId) -> Result<(), EngineError> {
        if is_protocol_account(account) {
            return Err(EngineError::ProtocolAccount(account));
        }
        Ok(())
    }

    pub(super) fn ensure_positive(amount: Amount, what: &'static str) -> Result<(), EngineError> {
        if amount.is_zero() {
            return Err(EngineError::InvalidAmount(what));
        }
        Ok(())
    }

    /// Log a rejected operation and hand the error back.
    pub(super) fn reject(&self, op: &'static str, account: AccountId, err: EngineError) -> EngineError {
        debug!(op, %account, kind = ?err.kind(), error = %err, "operation rejected");
        err
    }

    // ---- audit ----

    /// Cross-check positions against custody and the pool book.
    pub fn audit(&self) -> Result<(), String> {
        let mut collateral = Amount::ZERO;
        let mut debt = Amount::ZERO;
        for position in self.positions.values() {
            collateral = collateral
                .checked_add(position.collateral)
                .ok_or("collateral sum overflows")?;
            debt = debt
                .checked_add(position.debt)
                .ok_or("debt sum overflows")?;
        }

        let custody = self.gold.balance_of(LENDING_POOL);
        if collateral != custody {
            return Err(format!(
                "collateral {collateral} does not match pool custody {custody}"
            ));
        }
        if collateral != self.pool.total_collateral {
            return Err(format!(
                "collateral {collateral} does not match pool book {}",
                self.pool.total_collateral
            ));
        }
        if debt != self.pool.total_debt {
            return Err(format!(
                "debt {debt} does not match pool book {}",
                self.pool.total_debt
            ));
        }
        for asset in [Asset::Stable, Asset::Gold] {
            let ledger = self.ledger(asset);
            if ledger.sum_of_balances() != Some(ledger.total_supply()) {
                return Err(format!("{asset} balances do not sum to supply"));
            }
        }
        Ok(())
    }

    /// Run after every commit. a failed audit halts the engine when configured to.
    pub(super) fn check_books(&mut self) -> Result<(), EngineError> {
        let Err(reason) = self.audit() else {
            return Ok(());
        };
        if !self.config.halt_on_audit_failure {
            error!(%reason, "book audit failed");
            return Ok(());
        }
        Err(self.halt(reason))
    }

    pub(super) fn halt(&mut self, reason: String) -> EngineError {
        error!(%reason, "store corrupted, engine halted");
        self.halted = Some(reason.clone());
        self.emit_event(EventPayload::StoreCorrupted(StoreCorruptedEvent {
            reason: reason.clone(),
        }));
        EngineError::StoreCorrupted { reason }
    }

    // ---- events ----

    /// Observers get a copy of every event after it is recorded.
    pub fn add_observer(&mut self, observer: Box<dyn EventEmitter + Send>) {
        self.observers.push(observer);
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        for observer in &mut self.observers {
            observer.emit(event.clone());
        }

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
