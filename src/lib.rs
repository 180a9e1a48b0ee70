// emasx-core: tokenized gold exchange and collateralized lending engine.
// collateral-first architecture: LTV math and liquidation take priority.
// all computation is deterministic fixed point with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, Amount, Price, Bps, Percent, Asset
//   1.1  math.rs: widened mul/div with explicit rounding
//   2.x  token.rs: stablecoin and gold-token ledgers, roles, allowances
//   3.x  ltv.rs: LTV checks, borrow capacity, withdrawable collateral
//   4.x  position.rs: collateral/debt positions and their transitions
//   4.1  interest.rs: interest accrual hook (zero rate)
//   5.x  exchange.rs: fixed-price swap quotes with fee
//   6.x  liquidation.rs: liquidation detection, seizure, bad debt
//   7.x  config.rs: protocol params, env presets, toml loading
//   8.x  engine/: core engine: pricing, swaps, lending, liquidations, redemptions
//   9.x  price_feed.rs: authoritative gold price (single writer)
//   9.1  quote.rs: advisory market quotes and loan summaries
//   10.x reserve.rs: custody accounts, treasury and pool books
//   11.x events.rs: state transition events for audit
//   12.x redemption.rs: physical redemption registry

// core modules
pub mod engine;
pub mod events;
pub mod exchange;
pub mod interest;
pub mod liquidation;
pub mod ltv;
pub mod math;
pub mod position;
pub mod token;
pub mod types;

// custody and redemption
pub mod redemption;
pub mod reserve;

// integration modules
pub mod config;
pub mod price_feed;
pub mod quote;

// re exports for convenience
pub use config::{AppConfig, ConfigError, Environment, ProtocolParams};
pub use engine::*;
pub use events::*;
pub use exchange::{quote_swap, SwapQuote};
pub use liquidation::{LiquidationStatus, Seizure};
pub use math::MathError;
pub use position::{Position, PositionChange, PositionError};
pub use price_feed::{PriceFeed, PriceFeedError, PriceObservation};
pub use quote::{LoanSummary, MarketPriceSource, MarketQuote, StaticMarketSource, SwapEstimate};
pub use redemption::{GoldBar, RedemptionError, RedemptionId, RedemptionRecord, RedemptionStatus};
pub use reserve::{PoolBook, TreasuryBook, GOVERNANCE, LENDING_POOL, REDEMPTION_REGISTRY, TREASURY};
pub use token::{InMemoryToken, Role, TokenError, TokenLedger};
pub use types::*;
