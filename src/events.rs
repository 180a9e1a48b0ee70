// 11.0: every committed state change produces an event. used for audit trails and
// for notifying external systems (shipping, dashboards). observers receive events
// one way; the engine never calls back into whoever triggered the operation.

use crate::config::ProtocolParams;
use crate::redemption::{GoldBar, RedemptionId};
use crate::types::{AccountId, Amount, Price, SwapDirection, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    // Governance
    PriceUpdated(PriceUpdatedEvent),
    ParamsUpdated(ParamsUpdatedEvent),

    // Exchange
    Swap(SwapEvent),

    // Ledger
    Deposit(CollateralEvent),
    Withdrawal(CollateralEvent),
    Borrow(DebtEvent),
    Repay(DebtEvent),

    // Risk
    Liquidation(LiquidationEvent),
    BadDebt(BadDebtEvent),

    // Redemption
    Redemption(RedemptionEvent),
    RedemptionFulfilled(RedemptionFulfilledEvent),

    // Engine halted
    StoreCorrupted(StoreCorruptedEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdatedEvent {
    pub price: Price,
    pub round: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamsUpdatedEvent {
    pub params: ProtocolParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub account_id: AccountId,
    pub direction: SwapDirection,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee: Amount,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub new_collateral: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub new_debt: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub account_id: AccountId,
    pub liquidator: AccountId,
    pub price: Price,
    pub collateral_seized: Amount,
    pub penalty: Amount,
    pub debt_repaid: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadDebtEvent {
    pub account_id: AccountId,
    pub bad_debt: Amount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionEvent {
    pub redemption_id: RedemptionId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub bars: Vec<(GoldBar, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionFulfilledEvent {
    pub redemption_id: RedemptionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCorruptedEvent {
    pub reason: String,
}

pub trait EventEmitter {
    fn emit(&mut self, event: Event);
}

#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<Event>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventEmitter for EventCollector {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
