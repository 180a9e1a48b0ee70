// 8.0.2: result types and errors for engine operations.

use super::history::TradeId;
use crate::config::ConfigError;
use crate::math::MathError;
use crate::position::PositionError;
use crate::price_feed::PriceFeedError;
use crate::redemption::{RedemptionError, RedemptionId};
use crate::token::TokenError;
use crate::types::{AccountId, Amount, Asset, Percent, Price, SwapDirection, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    pub trade_id: TradeId,
    pub direction: SwapDirection,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub fee: Amount,
    pub price: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationResult {
    pub account_id: AccountId,
    pub liquidator: AccountId,
    pub price: Price,
    pub collateral_seized: Amount,
    pub penalty: Amount,
    pub debt_repaid: Amount,
    pub bad_debt: Amount,
    pub remaining_collateral: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub redemption_id: RedemptionId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub remaining_balance: Amount,
    pub timestamp: Timestamp,
}

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Bad input. rejected before any state was read.
    Validation,
    /// Would-be post-state breaks a position rule. nothing changed.
    Invariant,
    /// A balance or pool is short. nothing changed, may succeed later.
    Resource,
    /// State WAS committed but the outcome needs operator attention.
    Consistency,
    /// Books are broken. the engine refuses further mutation.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("{0} is a protocol custody account")]
    ProtocolAccount(AccountId),

    #[error("Price unavailable")]
    PriceUnavailable,

    #[error("Insufficient {asset} balance: available {available}, requested {requested}")]
    InsufficientBalance {
        asset: Asset,
        available: Amount,
        requested: Amount,
    },

    #[error("Insufficient {asset} reserve: available {available}, requested {requested}")]
    InsufficientReserve {
        asset: Asset,
        available: Amount,
        requested: Amount,
    },

    #[error("Transfer not authorized: allowance {allowance}, requested {requested}")]
    TransferNotAuthorized { allowance: Amount, requested: Amount },

    #[error("{asset} transfer failed: {source}")]
    TransferFailed { asset: Asset, source: TokenError },

    #[error("Exceeds max LTV {max_ltv}: debt {debt} against collateral {collateral} at {price}")]
    ExceedsMaxLTV {
        debt: Amount,
        collateral: Amount,
        price: Price,
        max_ltv: Percent,
    },

    #[error("Insufficient collateral: available {available}, requested {requested}")]
    InsufficientCollateral { available: Amount, requested: Amount },

    #[error("Insufficient liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity { available: Amount, requested: Amount },

    #[error("Repay {requested} exceeds debt {outstanding}")]
    ExceedsDebt { outstanding: Amount, requested: Amount },

    #[error("Account {0} is not liquidatable")]
    NotLiquidatable(AccountId),

    #[error("Liquidation of {} left bad debt {}", .0.account_id, .0.bad_debt)]
    BadDebtRemaining(Box<LiquidationResult>),

    #[error("Insufficient free balance: available {available}, requested {requested}")]
    InsufficientFreeBalance { available: Amount, requested: Amount },

    #[error("Store corrupted: {reason}")]
    StoreCorrupted { reason: String },

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Invalid params: {0}")]
    InvalidParams(#[from] ConfigError),

    #[error("Redemption error: {0}")]
    Redemption(#[from] RedemptionError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidAmount(_)
            | EngineError::ProtocolAccount(_)
            | EngineError::TransferNotAuthorized { .. }
            | EngineError::TransferFailed { .. }
            | EngineError::ArithmeticOverflow
            | EngineError::InvalidParams(_)
            | EngineError::Redemption(_) => ErrorKind::Validation,

            EngineError::ExceedsMaxLTV { .. }
            | EngineError::InsufficientCollateral { .. }
            | EngineError::ExceedsDebt { .. }
            | EngineError::NotLiquidatable(_) => ErrorKind::Invariant,

            EngineError::PriceUnavailable
            | EngineError::InsufficientBalance { .. }
            | EngineError::InsufficientReserve { .. }
            | EngineError::InsufficientLiquidity { .. }
            | EngineError::InsufficientFreeBalance { .. } => ErrorKind::Resource,

            EngineError::BadDebtRemaining(_) => ErrorKind::Consistency,

            EngineError::StoreCorrupted { .. } => ErrorKind::Fatal,
        }
    }

    /// Only shortfalls can clear up on their own.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Resource
    }

    /// True when the failed call still changed state.
    pub fn is_committed(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }
}

impl From<MathError> for EngineError {
    fn from(_: MathError) -> Self {
        EngineError::ArithmeticOverflow
    }
}

impl From<PriceFeedError> for EngineError {
    fn from(err: PriceFeedError) -> Self {
        match err {
            PriceFeedError::PriceUnavailable => EngineError::PriceUnavailable,
        }
    }
}

impl From<PositionError> for EngineError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::InsufficientCollateral {
                requested,
                available,
            } => EngineError::InsufficientCollateral {
                available,
                requested,
            },
            PositionError::ExceedsDebt {
                requested,
                outstanding,
            } => EngineError::ExceedsDebt {
                outstanding,
                requested,
            },
            PositionError::Overflow => EngineError::ArithmeticOverflow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        let liquidity = EngineError::InsufficientLiquidity {
            available: Amount::ZERO,
            requested: Amount::from_raw(1),
        };
        assert_eq!(liquidity.kind(), ErrorKind::Resource);
        assert!(liquidity.is_retryable());

        let ltv = EngineError::ExceedsMaxLTV {
            debt: Amount::from_raw(2),
            collateral: Amount::from_raw(1),
            price: Price::new(1).unwrap(),
            max_ltv: Percent::saturating(60),
        };
        assert_eq!(ltv.kind(), ErrorKind::Invariant);
        assert!(!ltv.is_retryable());

        let corrupted = EngineError::StoreCorrupted {
            reason: "debt mismatch".to_string(),
        };
        assert_eq!(corrupted.kind(), ErrorKind::Fatal);
        assert!(!corrupted.is_committed());
    }

    #[test]
    fn test_bad_debt_is_committed() {
        let result = LiquidationResult {
            account_id: AccountId::from_seed(1),
            liquidator: AccountId::from_seed(2),
            price: Price::from_units(5).unwrap(),
            collateral_seized: Amount::from_units(10).unwrap(),
            penalty: Amount::ZERO,
            debt_repaid: Amount::from_units(50).unwrap(),
            bad_debt: Amount::from_units(50).unwrap(),
            remaining_collateral: Amount::ZERO,
        };
        let err = EngineError::BadDebtRemaining(Box::new(result));
        assert_eq!(err.kind(), ErrorKind::Consistency);
        assert!(err.is_committed());
        assert!(err.to_string().contains("bad debt 50"));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(
            EngineError::from(MathError::Overflow),
            EngineError::ArithmeticOverflow
        );
        assert_eq!(
            EngineError::from(PriceFeedError::PriceUnavailable),
            EngineError::PriceUnavailable
        );
        let err = EngineError::from(PositionError::ExceedsDebt {
            requested: Amount::from_raw(5),
            outstanding: Amount::from_raw(3),
        });
        assert!(matches!(err, EngineError::ExceedsDebt { .. }));
    }
}
