//! Physical redemption: burn free gold-token, queue a delivery record.

use super::core::Engine;
use super::results::{ClaimReceipt, EngineError};
use crate::events::{EventPayload, RedemptionEvent, RedemptionFulfilledEvent};
use crate::redemption::{bars_amount, GoldBar, RedemptionId, RedemptionRecord};
use crate::reserve::REDEMPTION_REGISTRY;
use crate::token::TokenLedger;
use crate::types::{AccountId, Amount, Asset};
use tracing::info;

impl Engine {
    /// Gold-token in the wallet. collateral sits in pool custody and never counts.
    pub fn free_gold_balance(&self, account: AccountId) -> Amount {
        self.gold.balance_of(account)
    }

    pub fn claim(&mut self, account: AccountId, amount: Amount) -> Result<ClaimReceipt, EngineError> {
        self.ensure_operational()?;
        self.try_claim(account, amount, Vec::new())
            .map_err(|e| self.reject("claim", account, e))
    }

    /// Claim whole bars. the burn is the total grams of the order.
    pub fn claim_bars(
        &mut self,
        account: AccountId,
        bars: &[(GoldBar, u32)],
    ) -> Result<ClaimReceipt, EngineError> {
        self.ensure_operational()?;
        let result = match bars_amount(bars) {
            Some(amount) => self.try_claim(account, amount, bars.to_vec()),
            None => Err(EngineError::InvalidAmount("bar order is empty or too large")),
        };
        result.map_err(|e| self.reject("claim_bars", account, e))
    }

    fn try_claim(
        &mut self,
        account: AccountId,
        amount: Amount,
        bars: Vec<(GoldBar, u32)>,
    ) -> Result<ClaimReceipt, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount, "claim amount must be positive")?;

        let available = self.free_gold_balance(account);
        if available < amount {
            return Err(EngineError::InsufficientFreeBalance {
                available,
                requested: amount,
            });
        }

        self.gold
            .burn(REDEMPTION_REGISTRY, account, amount)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            })?;

        let record = self
            .redemptions
            .record(account, amount, bars.clone(), self.current_time);
        let remaining_balance = self.free_gold_balance(account);

        info!(%account, %amount, redemption = %record.id, "gold claimed for delivery");
        self.emit_event(EventPayload::Redemption(RedemptionEvent {
            redemption_id: record.id,
            account_id: account,
            amount,
            bars,
        }));
        self.check_books()?;

        Ok(ClaimReceipt {
            redemption_id: record.id,
            account_id: account,
            amount,
            remaining_balance,
            timestamp: record.timestamp,
        })
    }

    pub fn redemption(&self, id: RedemptionId) -> Option<&RedemptionRecord> {
        self.redemptions.get(id)
    }

    pub fn pending_redemptions(&self) -> Vec<&RedemptionRecord> {
        self.redemptions.pending()
    }

    pub fn redemptions_for(&self, account: AccountId) -> Vec<&RedemptionRecord> {
        self.redemptions.for_account(account)
    }

    /// Called by the fulfillment process once the gold has shipped.
    pub fn mark_fulfilled(&mut self, id: RedemptionId) -> Result<RedemptionRecord, EngineError> {
        self.ensure_operational()?;
        let record = self.redemptions.mark_fulfilled(id, self.current_time)?;
        info!(redemption = %id, account = %record.account, "redemption fulfilled");
        self.emit_event(EventPayload::RedemptionFulfilled(RedemptionFulfilledEvent {
            redemption_id: id,
        }));
        Ok(record)
    }
}
