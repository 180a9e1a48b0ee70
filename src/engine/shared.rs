//! Single-writer handle for sharing one engine across threads.
//!
//! Every operation takes the one lock, so all operations are totally ordered and
//! nothing sees a half-applied swap or liquidation. A poisoned lock means a
//! writer panicked mid-operation; the books can no longer be trusted and every
//! call reports `StoreCorrupted`.

use super::core::Engine;
use super::results::{EngineError, LiquidationResult, SwapResult};
use crate::types::{AccountId, Amount, SwapDirection};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine>, EngineError> {
        self.inner.lock().map_err(|_| EngineError::StoreCorrupted {
            reason: "engine lock poisoned".to_string(),
        })
    }

    /// Run `f` with exclusive access.
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> Result<R, EngineError>) -> Result<R, EngineError> {
        let mut engine = self.lock()?;
        f(&mut engine)
    }

    pub fn read<R>(&self, f: impl FnOnce(&Engine) -> R) -> Result<R, EngineError> {
        let engine = self.lock()?;
        Ok(f(&engine))
    }

    pub fn swap(
        &self,
        account: AccountId,
        direction: SwapDirection,
        amount_in: Amount,
    ) -> Result<SwapResult, EngineError> {
        self.with(|e| e.swap(account, direction, amount_in))
    }

    pub fn borrow(&self, account: AccountId, amount: Amount) -> Result<Amount, EngineError> {
        self.with(|e| e.borrow(account, amount))
    }

    pub fn liquidate(&self, account: AccountId, liquidator: AccountId) -> Result<LiquidationResult, EngineError> {
        self.with(|e| e.liquidate(account, liquidator))
    }
}
