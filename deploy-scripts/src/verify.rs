//! Post-deployment inspection of the Balloons / DEX deployment

use std::fmt::{self, Display};

use alloy_primitives::{Address, U256};
use eyre::{ensure, Result};

use crate::{
    config::ResolvedConfig,
    constants::{BALLOONS_CONTRACT_NAME, DEX_CONTRACT_NAME},
    contracts::{Balloons, Dex},
    deployments::Deployments,
    environment::DeployEnvironment,
};

/// The on-chain state of a Balloons / DEX deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
    /// The Balloons token address
    pub balloons: Address,
    /// The DEX address
    pub dex: Address,
    /// The token the DEX reports trading against
    pub dex_token: Address,
    /// The recipient of the initial transfer
    pub recipient: Address,
    /// The recipient's Balloons balance
    pub recipient_balance: U256,
    /// The DEX's Balloons reserve
    pub token_reserve: U256,
    /// The DEX's ether reserve
    pub native_reserve: U256,
    /// The total liquidity minted by the DEX
    pub total_liquidity: U256,
}

impl DeploymentReport {
    /// Check the report against the state a fresh deployment with `config`
    /// leaves behind
    pub fn check(&self, config: &ResolvedConfig) -> Result<()> {
        ensure!(!self.balloons.is_zero(), "Balloons is deployed at the zero address");
        ensure!(!self.dex.is_zero(), "DEX is deployed at the zero address");
        ensure!(self.balloons != self.dex, "Balloons and DEX share an address");
        ensure!(
            self.dex_token == self.balloons,
            "DEX trades {:#x}, expected Balloons at {:#x}",
            self.dex_token,
            self.balloons
        );

        let expected = config.recipient_amount.as_u256();
        ensure!(
            self.recipient_balance == expected,
            "recipient holds {} Balloons, expected {expected}",
            self.recipient_balance
        );

        let expected = config.liquidity_tokens.as_u256();
        ensure!(
            self.token_reserve == expected,
            "DEX token reserve is {}, expected {expected}",
            self.token_reserve
        );

        let expected = config.liquidity_value.as_u256();
        ensure!(
            self.native_reserve == expected,
            "DEX ether reserve is {}, expected {expected}",
            self.native_reserve
        );
        ensure!(!self.total_liquidity.is_zero(), "DEX has not been initialized");
        ensure!(
            self.total_liquidity == expected,
            "DEX total liquidity is {}, expected {expected}",
            self.total_liquidity
        );

        Ok(())
    }
}

impl Display for DeploymentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balloons:          {:#x}", self.balloons)?;
        writeln!(f, "DEX:               {:#x}", self.dex)?;
        writeln!(f, "recipient balance: {} ({:#x})", self.recipient_balance, self.recipient)?;
        writeln!(f, "token reserve:     {}", self.token_reserve)?;
        writeln!(f, "ether reserve:     {}", self.native_reserve)?;
        write!(f, "total liquidity:   {}", self.total_liquidity)
    }
}

/// Read the state of the recorded Balloons / DEX deployment
pub async fn inspect<E: DeployEnvironment>(
    env: &E,
    deployments: &Deployments,
    recipient: Address,
) -> Result<DeploymentReport> {
    let balloons = Balloons::new(deployments.address(BALLOONS_CONTRACT_NAME)?, env);
    let dex = Dex::new(deployments.address(DEX_CONTRACT_NAME)?, env);

    Ok(DeploymentReport {
        balloons: balloons.address(),
        dex: dex.address(),
        dex_token: dex.token().await?,
        recipient,
        recipient_balance: balloons.balance_of(recipient).await?,
        token_reserve: balloons.balance_of(dex.address()).await?,
        native_reserve: dex.native_reserve().await?,
        total_liquidity: dex.total_liquidity().await?,
    })
}
