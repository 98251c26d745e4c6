//! Parameters of the Balloons / DEX deployment.
//!
//! Every parameter has a built-in default; a TOML file may override any
//! subset of them:
//!
//! ```toml
//! recipient = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
//! recipient_amount = "10"
//! liquidity_tokens = "0.1"
//! liquidity_value = "0.1"
//! init_gas_limit = 200000
//! auto_mine = true
//! ```

use std::{fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        DEFAULT_INIT_GAS_LIMIT, DEFAULT_LIQUIDITY_TOKENS, DEFAULT_LIQUIDITY_VALUE,
        DEFAULT_RECIPIENT, DEFAULT_RECIPIENT_AMOUNT, TOKEN_DECIMALS,
    },
    errors::ScriptError,
    units::TokenAmount,
};

/// The deployment parameters, as written in a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployConfig {
    /// The address that receives the initial Balloons transfer
    pub recipient: Address,
    /// The number of whole Balloons sent to the recipient
    pub recipient_amount: String,
    /// The number of whole Balloons the DEX is seeded with
    pub liquidity_tokens: String,
    /// The amount of ether the DEX is seeded with
    pub liquidity_value: String,
    /// The gas limit attached to the DEX `init` call
    pub init_gas_limit: u64,
    /// The number of decimals of the Balloons token
    pub token_decimals: u8,
    /// Whether to mine deployments immediately on local networks
    pub auto_mine: bool,
    /// Whether to log deployments at `info` level
    pub log: bool,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            recipient: DEFAULT_RECIPIENT,
            recipient_amount: DEFAULT_RECIPIENT_AMOUNT.to_string(),
            liquidity_tokens: DEFAULT_LIQUIDITY_TOKENS.to_string(),
            liquidity_value: DEFAULT_LIQUIDITY_VALUE.to_string(),
            init_gas_limit: DEFAULT_INIT_GAS_LIMIT,
            token_decimals: TOKEN_DECIMALS,
            auto_mine: true,
            log: true,
        }
    }
}

impl DeployConfig {
    /// Load a config from a TOML file, filling unset fields with defaults
    pub fn from_file(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    /// Parse a config from a TOML string, filling unset fields with defaults
    pub fn from_toml(contents: &str) -> Result<Self, ScriptError> {
        toml::from_str(contents).map_err(|e| ScriptError::Config(e.message().to_string()))
    }

    /// Load the config at `path` if given, otherwise use the defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ScriptError> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// Validate the config, scaling every amount into base units
    pub fn resolve(&self) -> Result<ResolvedConfig, ScriptError> {
        if self.recipient.is_zero() {
            return Err(ScriptError::Config("recipient is the zero address".to_string()));
        }
        if self.init_gas_limit == 0 {
            return Err(ScriptError::Config("init gas limit must be non-zero".to_string()));
        }

        Ok(ResolvedConfig {
            recipient: self.recipient,
            recipient_amount: TokenAmount::parse(&self.recipient_amount, self.token_decimals)?,
            liquidity_tokens: TokenAmount::parse(&self.liquidity_tokens, self.token_decimals)?,
            liquidity_value: TokenAmount::ether(&self.liquidity_value)?,
            init_gas_limit: self.init_gas_limit,
            auto_mine: self.auto_mine,
            log: self.log,
        })
    }
}

/// A validated config with every amount in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// The address that receives the initial Balloons transfer
    pub recipient: Address,
    /// The Balloons sent to the recipient
    pub recipient_amount: TokenAmount,
    /// The Balloons the DEX is seeded with, also the approved allowance
    pub liquidity_tokens: TokenAmount,
    /// The wei the DEX is seeded with
    pub liquidity_value: TokenAmount,
    /// The gas limit attached to the DEX `init` call
    pub init_gas_limit: u64,
    /// Whether to mine deployments immediately on local networks
    pub auto_mine: bool,
    /// Whether to log deployments at `info` level
    pub log: bool,
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, U256};

    use super::DeployConfig;
    use crate::constants::DEFAULT_RECIPIENT;

    #[test]
    fn test_defaults() {
        let resolved = DeployConfig::default().resolve().unwrap();
        assert_eq!(resolved.recipient, DEFAULT_RECIPIENT);
        assert_eq!(resolved.recipient_amount.as_u256(), U256::from(10u128.pow(19)));
        assert_eq!(resolved.liquidity_tokens.as_u256(), U256::from(10u128.pow(17)));
        assert_eq!(resolved.liquidity_value.as_u256(), U256::from(10u128.pow(17)));
        assert_eq!(resolved.init_gas_limit, 200_000);
    }

    #[test]
    fn test_partial_toml_override() {
        let config = DeployConfig::from_toml(
            r#"
            recipient = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            liquidity_tokens = "5"
            "#,
        )
        .unwrap();

        assert_eq!(config.recipient, address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"));
        assert_eq!(config.liquidity_tokens, "5");
        assert_eq!(config.liquidity_value, "0.1");
        assert_eq!(config.init_gas_limit, 200_000);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(DeployConfig::from_toml("gas = 1").is_err());
    }

    #[test]
    fn test_resolve_rejects_bad_amounts() {
        let config = DeployConfig {
            liquidity_value: "-0.1".to_string(),
            ..Default::default()
        };
        assert!(config.resolve().is_err());

        let config = DeployConfig {
            recipient: alloy_primitives::Address::ZERO,
            ..Default::default()
        };
        assert!(config.resolve().is_err());
    }
}
