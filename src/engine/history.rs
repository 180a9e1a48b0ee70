//! Executed swap history.

use super::core::Engine;
use crate::exchange::SwapQuote;
use crate::types::{AccountId, Amount, Price, SwapDirection, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TradeId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: TradeId,
    pub account_id: AccountId,
    pub direction: SwapDirection,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee: Amount,
    /// Feed price the swap executed against
    pub price: Price,
    pub timestamp: Timestamp,
}

impl TradeRecord {
    /// Stablecoin paid or received per gold-token, fee included. display only.
    pub fn effective_price(&self) -> Option<Decimal> {
        let (stable, gold) = match self.direction {
            SwapDirection::StableToGold => (self.amount_in, self.amount_out),
            SwapDirection::GoldToStable => (self.amount_out, self.amount_in),
        };
        stable.to_decimal().checked_div(gold.to_decimal())
    }
}

impl Engine {
    pub(super) fn record_trade(&mut self, account_id: AccountId, quote: &SwapQuote) -> TradeId {
        let id = TradeId(self.next_trade_id);
        self.next_trade_id += 1;

        self.trades.push_back(TradeRecord {
            id,
            account_id,
            direction: quote.direction,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            price: quote.price,
            timestamp: self.current_time,
        });

        while self.trades.len() > self.config.max_trades {
            self.trades.pop_front();
        }
        id
    }

    /// Up to `count` most recent trades, oldest first.
    pub fn recent_trades(&self, count: usize) -> Vec<&TradeRecord> {
        let skip = self.trades.len().saturating_sub(count);
        self.trades.iter().skip(skip).collect()
    }

    pub fn trades_for(&self, account_id: AccountId) -> Vec<&TradeRecord> {
        self.trades
            .iter()
            .filter(|t| t.account_id == account_id)
            .collect()
    }
}
