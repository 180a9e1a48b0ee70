// 8.0: core engine. coordinates the price feed, the exchange, the position ledger,
// liquidations and redemptions over one set of token ledgers.
// deterministic and event-driven with no external I/O. every operation samples
// the feed and the parameter snapshot once and commits all or nothing.

mod config;
mod core;
mod exchange;
mod history;
mod lending;
mod liquidations;
mod pricing;
mod redemption;
mod results;
mod shared;

pub use config::EngineConfig;
pub use core::Engine;
pub use history::{TradeId, TradeRecord};
pub use results::{ClaimReceipt, EngineError, ErrorKind, LiquidationResult, SwapResult};
pub use shared::SharedEngine;
