//! Price feed and parameter governance.

use super::core::Engine;
use super::results::EngineError;
use crate::config::ProtocolParams;
use crate::events::{EventPayload, ParamsUpdatedEvent, PriceUpdatedEvent};
use crate::price_feed::PriceObservation;
use crate::types::Price;
use tracing::info;

impl Engine {
    /// The authoritative feed price. fails only if it was never set.
    pub fn get_price(&self) -> Result<Price, EngineError> {
        Ok(self.feed.get_price()?)
    }

    pub fn price_observation(&self) -> Result<PriceObservation, EngineError> {
        Ok(self.feed.latest()?)
    }

    /// Governance: install a new feed price.
    pub fn set_price(&mut self, price: Price) -> Result<PriceObservation, EngineError> {
        self.ensure_operational()?;
        let observation = self.feed.set_price(price, self.current_time);

        info!(%price, round = observation.round, "feed price updated");
        self.emit_event(EventPayload::PriceUpdated(PriceUpdatedEvent {
            price,
            round: observation.round,
        }));
        Ok(observation)
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Governance: validate and install a new parameter snapshot. the engine
    /// assigns the version, whatever the caller put there.
    pub fn update_params(&mut self, params: ProtocolParams) -> Result<ProtocolParams, EngineError> {
        self.ensure_operational()?;
        params.validate()?;

        let mut next = params;
        next.version = self.params.version + 1;
        self.params = next.clone();

        info!(
            version = next.version,
            max_ltv = %next.max_ltv,
            liquidation_ltv = %next.liquidation_ltv,
            fee = %next.fee_bps,
            "protocol params updated"
        );
        self.emit_event(EventPayload::ParamsUpdated(ParamsUpdatedEvent {
            params: next.clone(),
        }));
        Ok(next)
    }
}
