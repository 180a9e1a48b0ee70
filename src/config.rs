// 7.0 config.rs: all settings in one place. ltv thresholds, fees, penalty, engine limits.
// 7.1 ProtocolParams is a versioned snapshot. every operation captures one snapshot and
// uses it for its whole duration, so tests can run any parameter set in isolation.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::EngineConfig;
use crate::types::{Amount, Bps, Percent, Price, BPS_DENOMINATOR};

/** 7.2: governance-owned protocol parameters. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // Bumped by the engine on every governance update
    #[serde(default)]
    pub version: u64,
    // Max debt / collateral value after any owner-initiated mutation
    pub max_ltv: Percent,
    // Liquidatable once debt / collateral value exceeds this
    pub liquidation_ltv: Percent,
    // Fee on every swap leg
    pub fee_bps: Bps,
    // Nominal rate, display only until accrual is specified
    pub annual_interest_bps: Bps,
    // Extra collateral seized on liquidation, paid to the liquidator
    pub liquidation_penalty_bps: Bps,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            version: 0,
            max_ltv: Percent::saturating(60),
            liquidation_ltv: Percent::saturating(80),
            fee_bps: Bps::new(30),            // 0.3%
            annual_interest_bps: Bps::new(450), // 4.5%
            liquidation_penalty_bps: Bps::ZERO,
        }
    }
}

impl ProtocolParams {
    // Relaxed preset for testnet
    pub fn testnet() -> Self {
        let mut params = Self::default();
        params.max_ltv = Percent::saturating(70);
        params.liquidation_ltv = Percent::saturating(85);
        params.fee_bps = Bps::ZERO;
        params
    }

    // Conservative preset for mainnet
    pub fn mainnet_conservative() -> Self {
        let mut params = Self::default();
        params.max_ltv = Percent::saturating(50);
        params.liquidation_ltv = Percent::saturating(75);
        params.fee_bps = Bps::new(50);
        params
    }

    // Validate the parameters for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_ltv.value() == 0 {
            return Err(ConfigError::InvalidLtv {
                reason: "max LTV must be positive".to_string(),
            });
        }

        if self.liquidation_ltv.value() > 100 {
            return Err(ConfigError::InvalidLtv {
                reason: format!("liquidation LTV {} above 100%", self.liquidation_ltv),
            });
        }

        if self.liquidation_ltv < self.max_ltv {
            return Err(ConfigError::InvalidLtv {
                reason: format!(
                    "liquidation LTV {} below max LTV {}",
                    self.liquidation_ltv, self.max_ltv
                ),
            });
        }

        if self.fee_bps.value() >= BPS_DENOMINATOR {
            return Err(ConfigError::InvalidFees {
                reason: format!("swap fee {} consumes the whole swap", self.fee_bps),
            });
        }

        if self.liquidation_penalty_bps.value() >= BPS_DENOMINATOR {
            return Err(ConfigError::InvalidFees {
                reason: format!("liquidation penalty {} is 100% or more", self.liquidation_penalty_bps),
            });
        }

        if self.annual_interest_bps.value() > BPS_DENOMINATOR {
            return Err(ConfigError::InvalidFees {
                reason: "annual interest above 100%".to_string(),
            });
        }

        Ok(())
    }
}

// Logging configuration for the simulation binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    // EnvFilter directive, overridden by RUST_LOG
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// Initial funding and price for a fresh deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    // Feed price in whole stablecoin per gold-token
    pub initial_price_units: u64,
    // Stablecoin sent to the exchange treasury
    pub treasury_funding_units: u64,
    // Stablecoin sent to the lending pool
    pub pool_funding_units: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            initial_price_units: 2_922_500,
            treasury_funding_units: 100_000_000,
            pool_funding_units: 500_000_000,
        }
    }
}

impl BootstrapConfig {
    pub fn initial_price(&self) -> Result<Price, ConfigError> {
        Price::from_units(u128::from(self.initial_price_units)).ok_or_else(|| ConfigError::InvalidBootstrap {
            reason: "initial price must be positive and fit 18 decimals".to_string(),
        })
    }

    pub fn treasury_funding(&self) -> Result<Amount, ConfigError> {
        units(self.treasury_funding_units)
    }

    pub fn pool_funding(&self) -> Result<Amount, ConfigError> {
        units(self.pool_funding_units)
    }
}

fn units(value: u64) -> Result<Amount, ConfigError> {
    Amount::from_units(u128::from(value)).ok_or_else(|| ConfigError::InvalidBootstrap {
        reason: format!("{value} does not fit 18 decimals"),
    })
}

// The complete application configuration, loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    // Replaces the environment preset when present
    #[serde(default)]
    pub params: Option<ProtocolParams>,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LogConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            params: None,
            engine: EngineConfig::default(),
            logging: LogConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.protocol_params().validate()?;
        Ok(config)
    }

    // Missing file means defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn protocol_params(&self) -> ProtocolParams {
        self.params
            .clone()
            .unwrap_or_else(|| self.environment.params())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid LTV: {reason}")]
    InvalidLtv { reason: String },

    #[error("invalid fees: {reason}")]
    InvalidFees { reason: String },

    #[error("invalid bootstrap: {reason}")]
    InvalidBootstrap { reason: String },

    #[error("cannot read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("cannot parse config: {0}")]
    Parse(String),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn params(&self) -> ProtocolParams {
        match self {
            Environment::Development => ProtocolParams::default(),
            Environment::Testnet => ProtocolParams::testnet(),
            Environment::Mainnet => ProtocolParams::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = ProtocolParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.max_ltv.value(), 60);
        assert_eq!(params.annual_interest_bps, Bps::new(450));
    }

    #[test]
    fn test_presets_valid() {
        assert!(Environment::Development.params().validate().is_ok());
        assert!(Environment::Testnet.params().validate().is_ok());
        assert!(Environment::Mainnet.params().validate().is_ok());
        assert_eq!(ProtocolParams::testnet().fee_bps, Bps::ZERO);
    }

    #[test]
    fn test_liquidation_below_max_rejected() {
        let mut params = ProtocolParams::default();
        params.liquidation_ltv = Percent::new(50).unwrap();

        let result = params.validate();
        assert!(matches!(result, Err(ConfigError::InvalidLtv { .. })));
    }

    #[test]
    fn test_zero_max_ltv_rejected() {
        let mut params = ProtocolParams::default();
        params.max_ltv = Percent::new(0).unwrap();
        assert!(matches!(params.validate(), Err(ConfigError::InvalidLtv { .. })));
    }

    #[test]
    fn test_full_fee_rejected() {
        let mut params = ProtocolParams::default();
        params.fee_bps = Bps::new(10_000);
        assert!(matches!(params.validate(), Err(ConfigError::InvalidFees { .. })));
    }

    #[test]
    fn test_app_config_from_toml() {
        let content = r#"
            environment = "testnet"

            [bootstrap]
            initial_price_units = 3000000
            treasury_funding_units = 10
            pool_funding_units = 20
        "#;
        let config = AppConfig::from_toml(content).unwrap();
        assert_eq!(config.environment, Environment::Testnet);
        assert_eq!(config.protocol_params(), ProtocolParams::testnet());
        assert_eq!(
            config.bootstrap.initial_price().unwrap(),
            Price::from_units(3_000_000).unwrap()
        );
        assert_eq!(config.engine.max_events, 100_000);
    }

    #[test]
    fn test_app_config_params_override() {
        let content = r#"
            environment = "development"

            [params]
            max_ltv = 50
            liquidation_ltv = 40
            fee_bps = 30
            annual_interest_bps = 450
            liquidation_penalty_bps = 500
        "#;
        let result = AppConfig::from_toml(content);
        assert!(matches!(result, Err(ConfigError::InvalidLtv { .. })));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/emasx.toml")).unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_params_serialization() {
        let params = ProtocolParams::mainnet_conservative();
        let json = serde_json::to_string(&params).unwrap();
        let back: ProtocolParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
