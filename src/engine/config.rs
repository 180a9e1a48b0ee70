//! Engine configuration options.

use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Maximum number of swap records kept for the trade history.
    pub max_trades: usize,
    /// Stop accepting mutations after a failed book audit.
    pub halt_on_audit_failure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            max_trades: 1_000,
            halt_on_audit_failure: true,
        }
    }
}
