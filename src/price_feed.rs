// Authoritative price feed
//
// The one price the engine executes against. It is set by governance, read once
// per operation, and never cached across operations. External market prices live
// in `quote` and are display-only; the two are never mixed.

use crate::types::{Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single accepted feed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Price,
    /// Increments on every update, starting at 1
    pub round: u64,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceFeedError {
    #[error("price unavailable: feed has never been set")]
    PriceUnavailable,
}

#[derive(Debug, Clone)]
pub struct PriceFeed {
    current: Option<PriceObservation>,
    /// Recent observations, oldest first
    history: VecDeque<PriceObservation>,
    max_history: usize,
}

impl Default for PriceFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceFeed {
    pub fn new() -> Self {
        Self {
            current: None,
            history: VecDeque::new(),
            max_history: 100,
        }
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history.max(1);
        self
    }

    /// Install a new price. Returns the accepted observation.
    pub fn set_price(&mut self, price: Price, timestamp: Timestamp) -> PriceObservation {
        let round = self.current.map(|o| o.round + 1).unwrap_or(1);
        let observation = PriceObservation {
            price,
            round,
            updated_at: timestamp,
        };
        self.current = Some(observation);
        self.history.push_back(observation);
        while self.history.len() > self.max_history {
            self.history.pop_front();
        }
        observation
    }

    pub fn get_price(&self) -> Result<Price, PriceFeedError> {
        self.latest().map(|o| o.price)
    }

    pub fn latest(&self) -> Result<PriceObservation, PriceFeedError> {
        self.current.ok_or(PriceFeedError::PriceUnavailable)
    }

    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    pub fn round(&self) -> u64 {
        self.current.map(|o| o.round).unwrap_or(0)
    }

    pub fn history(&self) -> impl Iterator<Item = &PriceObservation> {
        self.history.iter()
    }
}
