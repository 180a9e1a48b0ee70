//! Stablecoin <-> gold-token swaps against the feed price.

use super::core::Engine;
use super::results::{EngineError, SwapResult};
use crate::events::{EventPayload, SwapEvent};
use crate::exchange::{quote_swap, SwapQuote};
use crate::quote::{estimate_swap, MarketQuote, SwapEstimate};
use crate::reserve::TREASURY;
use crate::token::TokenLedger;
use crate::types::{AccountId, Amount, Asset, SwapDirection};
use rust_decimal::Decimal;
use tracing::info;

impl Engine {
    /// Authoritative quote at the current feed price. read-only.
    pub fn quote_swap(&self, direction: SwapDirection, amount_in: Amount) -> Result<SwapQuote, EngineError> {
        Self::ensure_positive(amount_in, "swap amount must be positive")?;
        let price = self.feed.get_price()?;
        Ok(quote_swap(direction, amount_in, price, self.params.fee_bps)?)
    }

    /// Display estimate from an external market quote. never used to execute.
    pub fn estimate_swap(
        &self,
        direction: SwapDirection,
        amount_in: Decimal,
        market: &MarketQuote,
    ) -> Option<SwapEstimate> {
        estimate_swap(direction, amount_in, market, self.params.fee_bps)
    }

    /// Swap `amount_in` of the input asset. stable -> gold pulls stablecoin through
    /// the treasury's allowance; gold -> stable burns from the wallet directly.
    pub fn swap(
        &mut self,
        account: AccountId,
        direction: SwapDirection,
        amount_in: Amount,
    ) -> Result<SwapResult, EngineError> {
        self.ensure_operational()?;
        self.try_swap(account, direction, amount_in)
            .map_err(|e| self.reject("swap", account, e))
    }

    fn try_swap(
        &mut self,
        account: AccountId,
        direction: SwapDirection,
        amount_in: Amount,
    ) -> Result<SwapResult, EngineError> {
        self.ensure_user(account)?;
        Self::ensure_positive(amount_in, "swap amount must be positive")?;

        let price = self.feed.get_price()?;
        let quote = quote_swap(direction, amount_in, price, self.params.fee_bps)?;
        if quote.amount_out.is_zero() {
            return Err(EngineError::InvalidAmount("swap output rounds to zero"));
        }

        // every check before the first leg moves
        let available = self.balance_of(direction.input(), account);
        if available < amount_in {
            return Err(EngineError::InsufficientBalance {
                asset: direction.input(),
                available,
                requested: amount_in,
            });
        }
        let mut book = self.treasury.clone();
        book.record_swap(&quote)?;

        match direction {
            SwapDirection::StableToGold => self.execute_buy(account, &quote)?,
            SwapDirection::GoldToStable => self.execute_sell(account, &quote)?,
        }

        self.treasury = book;
        let trade_id = self.record_trade(account, &quote);

        info!(
            %account,
            ?direction,
            amount_in = %quote.amount_in,
            amount_out = %quote.amount_out,
            fee = %quote.fee,
            price = %quote.price,
            "swap executed"
        );
        self.emit_event(EventPayload::Swap(SwapEvent {
            account_id: account,
            direction,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            price: quote.price,
        }));
        self.check_books()?;

        Ok(SwapResult {
            trade_id,
            direction,
            amount_in: quote.amount_in,
            amount_out: quote.amount_out,
            fee: quote.fee,
            price: quote.price,
        })
    }

    // stable in to the treasury, gold minted out
    fn execute_buy(&mut self, account: AccountId, quote: &SwapQuote) -> Result<(), EngineError> {
        let allowance = self.stable.allowance(account, TREASURY);
        if allowance < quote.amount_in {
            return Err(EngineError::TransferNotAuthorized {
                allowance,
                requested: quote.amount_in,
            });
        }

        self.stable
            .transfer_from(TREASURY, account, TREASURY, quote.amount_in)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            })?;

        if let Err(source) = self.gold.mint(TREASURY, account, quote.amount_out) {
            // undo the stable leg
            let undo = self.stable.transfer(TREASURY, account, quote.amount_in);
            self.stable.approve(account, TREASURY, allowance);
            if let Err(e) = undo {
                return Err(self.halt(format!("swap rollback failed: {e}")));
            }
            return Err(EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            });
        }
        Ok(())
    }

    // gold burned from the wallet, stable paid from the treasury
    fn execute_sell(&mut self, account: AccountId, quote: &SwapQuote) -> Result<(), EngineError> {
        let reserve = self.stable.balance_of(TREASURY);
        if reserve < quote.amount_out {
            return Err(EngineError::InsufficientReserve {
                asset: Asset::Stable,
                available: reserve,
                requested: quote.amount_out,
            });
        }

        self.gold
            .burn(TREASURY, account, quote.amount_in)
            .map_err(|source| EngineError::TransferFailed {
                asset: Asset::Gold,
                source,
            })?;

        if let Err(source) = self.stable.transfer(TREASURY, account, quote.amount_out) {
            if let Err(e) = self.gold.mint(TREASURY, account, quote.amount_in) {
                return Err(self.halt(format!("swap rollback failed: {e}")));
            }
            return Err(EngineError::TransferFailed {
                asset: Asset::Stable,
                source,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, ProtocolParams};
    use crate::engine::{Engine, EngineConfig, EngineError};
    use crate::events::EventPayload;
    use crate::reserve::TREASURY;
    use crate::types::{AccountId, Amount, Asset, Bps, Price, SwapDirection};

    fn units(n: u128) -> Amount {
        Amount::from_units(n).unwrap()
    }

    fn alice() -> AccountId {
        AccountId::from_seed(1)
    }

    fn setup() -> Engine {
        let mut engine = Engine::bootstrap(&AppConfig::default()).unwrap();
        engine.mint_stable(alice(), units(10_000_000)).unwrap();
        engine
    }

    #[test]
    fn test_buy_gold() {
        let mut engine = setup();
        engine
            .approve(Asset::Stable, alice(), TREASURY, units(2_922_500))
            .unwrap();

        let result = engine
            .swap(alice(), SwapDirection::StableToGold, units(2_922_500))
            .unwrap();

        // 0.3% fee
        assert_eq!(result.amount_out, Amount::from_raw(997_000_000_000_000_000));
        assert_eq!(engine.balance_of(Asset::Gold, alice()), result.amount_out);
        assert_eq!(engine.balance_of(Asset::Stable, alice()), units(7_077_500));
        assert_eq!(engine.treasury_reserve(), units(102_922_500));
        assert_eq!(engine.allowance(Asset::Stable, alice(), TREASURY), Amount::ZERO);
        assert_eq!(engine.treasury_book().fees_collected, result.fee);
        assert!(matches!(
            engine.events().last().unwrap().payload,
            EventPayload::Swap(_)
        ));
    }

    #[test]
    fn test_buy_without_allowance() {
        let mut engine = setup();
        let err = engine
            .swap(alice(), SwapDirection::StableToGold, units(100))
            .unwrap_err();
        assert!(matches!(err, EngineError::TransferNotAuthorized { .. }));
        assert_eq!(engine.balance_of(Asset::Stable, alice()), units(10_000_000));
        assert_eq!(engine.total_supply(Asset::Gold), Amount::ZERO);
    }

    #[test]
    fn test_buy_insufficient_balance() {
        let mut engine = setup();
        engine
            .approve(Asset::Stable, alice(), TREASURY, units(20_000_000))
            .unwrap();
        let err = engine
            .swap(alice(), SwapDirection::StableToGold, units(20_000_000))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InsufficientBalance {
                asset: Asset::Stable,
                ..
            }
        ));
    }

    #[test]
    fn test_sell_gold() {
        let mut engine = setup();
        engine
            .approve(Asset::Stable, alice(), TREASURY, units(5_845_000))
            .unwrap();
        engine
            .swap(alice(), SwapDirection::StableToGold, units(5_845_000))
            .unwrap();
        let gold = engine.balance_of(Asset::Gold, alice());

        let result = engine
            .swap(alice(), SwapDirection::GoldToStable, gold)
            .unwrap();
        assert_eq!(engine.balance_of(Asset::Gold, alice()), Amount::ZERO);
        assert_eq!(engine.total_supply(Asset::Gold), Amount::ZERO);
        // round trip never returns more than went in
        assert!(result.amount_out < units(5_845_000));
        assert_eq!(engine.recent_trades(10).len(), 2);
    }

    #[test]
    fn test_sell_insufficient_reserve() {
        let mut engine = Engine::new(ProtocolParams::default(), EngineConfig::default()).unwrap();
        engine.set_price(Price::from_units(10).unwrap()).unwrap();
        engine.fund_treasury(units(100)).unwrap();
        engine.mint_stable(alice(), units(50)).unwrap();
        engine.approve(Asset::Stable, alice(), TREASURY, units(50)).unwrap();
        engine
            .swap(alice(), SwapDirection::StableToGold, units(50))
            .unwrap();

        // price jumps, the treasury can no longer cover a full sell
        engine.set_price(Price::from_units(1_000).unwrap()).unwrap();
        let gold = engine.balance_of(Asset::Gold, alice());
        let err = engine
            .swap(alice(), SwapDirection::GoldToStable, gold)
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientReserve { .. }));
        assert_eq!(engine.balance_of(Asset::Gold, alice()), gold);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_zero_and_dust_rejected() {
        let mut engine = setup();
        let err = engine
            .swap(alice(), SwapDirection::StableToGold, Amount::ZERO)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));

        engine
            .approve(Asset::Stable, alice(), TREASURY, Amount::from_raw(1))
            .unwrap();
        let err = engine
            .swap(alice(), SwapDirection::StableToGold, Amount::from_raw(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    #[test]
    fn test_quote_matches_execution() {
        let mut engine = setup();
        let quote = engine
            .quote_swap(SwapDirection::StableToGold, units(1_000_000))
            .unwrap();
        assert_eq!(quote.fee_bps, Bps::new(30));

        engine
            .approve(Asset::Stable, alice(), TREASURY, units(1_000_000))
            .unwrap();
        let result = engine
            .swap(alice(), SwapDirection::StableToGold, units(1_000_000))
            .unwrap();
        assert_eq!(result.amount_out, quote.amount_out);
    }
}
