//! Deployment units and the Balloons / DEX deployment.
//!
//! A [`DeployUnit`] is a named, taggable step of a deployment. Units are
//! selected by tag, so that a single deployment can be run on its own.

use std::path::Path;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
use itertools::Itertools;
use tracing::{info, warn};

use crate::{
    artifacts::Artifacts,
    config::ResolvedConfig,
    constants::{
        BALLOONS_CONTRACT_NAME, BALLOONS_DEX_TAGS, DEFAULT_RECIPIENT, DEX_CONTRACT_NAME,
        ESTIMATED_DEPLOY_GAS, ESTIMATED_TOKEN_CALL_GAS,
    },
    contracts::{Balloons, Dex},
    deployments::Deployments,
    environment::{is_local_chain, DeployEnvironment, DeployRequest, DeploymentRecord, TxOutcome},
    errors::ScriptError,
};

/// A named, taggable deployment step
#[allow(async_fn_in_trait)]
pub trait DeployUnit {
    /// The result of running the unit
    type Output;

    /// A short identifier for the unit, used in logs
    fn id(&self) -> &'static str;

    /// The tags the unit can be selected by
    fn tags(&self) -> &'static [&'static str];

    /// Whether the unit runs for the requested tags.
    ///
    /// An empty request selects every unit.
    fn selected_by(&self, requested: &[String]) -> bool {
        requested.is_empty() || self.tags().iter().any(|tag| requested.iter().any(|r| r == tag))
    }

    /// Run the unit against `env`, recording deployments in `deployments`
    async fn run<E: DeployEnvironment>(
        &self,
        env: &E,
        deployments: &mut Deployments,
    ) -> Result<Self::Output, ScriptError>;
}

/// Deploy a contract from its artifact and record the deployment
async fn deploy_contract<E: DeployEnvironment>(
    env: &E,
    deployments: &mut Deployments,
    artifacts: &Artifacts,
    config: &ResolvedConfig,
    name: &str,
    constructor_args: Vec<u8>,
    display_args: Vec<String>,
) -> Result<DeploymentRecord, ScriptError> {
    let artifact = artifacts.get(name)?;
    artifact.check_constructor_args(display_args.len())?;

    let record = env
        .deploy(DeployRequest {
            name: name.to_string(),
            bytecode: artifact.bytecode.clone(),
            constructor_args: constructor_args.into(),
            display_args,
            log: config.log,
            auto_mine: config.auto_mine,
        })
        .await?;

    deployments.insert(name, record.clone())?;
    Ok(record)
}

/// The addresses and transactions produced by the Balloons / DEX deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalloonsDexOutcome {
    /// The Balloons token address
    pub balloons: Address,
    /// The DEX address
    pub dex: Address,
    /// The transfer of Balloons to the recipient
    pub recipient_transfer: TxOutcome,
    /// The approval of the DEX as a spender of the deployer's Balloons
    pub approval: TxOutcome,
    /// The initialization of the DEX's pool
    pub init: TxOutcome,
}

/// Deploys the Balloons token and the DEX, funds the recipient, and seeds
/// the DEX with its initial liquidity
pub struct BalloonsDexDeployment {
    /// The deployment parameters
    config: ResolvedConfig,
    /// The compiled Balloons and DEX contracts
    artifacts: Artifacts,
}

impl BalloonsDexDeployment {
    /// Create the deployment from its parameters and artifacts
    pub fn new(config: ResolvedConfig, artifacts: Artifacts) -> Self {
        Self { config, artifacts }
    }

    /// Load the Balloons and DEX artifacts from a Hardhat or Foundry build
    /// directory
    pub fn load_artifacts(&mut self, dir: &Path) -> Result<(), ScriptError> {
        self.artifacts = Artifacts::load(dir, &[BALLOONS_CONTRACT_NAME, DEX_CONTRACT_NAME])?;
        Ok(())
    }

    /// The wei the deployer must hold for the whole run at `gas_price`: the
    /// ether the DEX is seeded with, plus gas for both deployments, the
    /// token transfer and approval, and the `init` call
    pub fn required_funds(&self, gas_price: u128) -> U256 {
        let gas =
            2 * ESTIMATED_DEPLOY_GAS + 2 * ESTIMATED_TOKEN_CALL_GAS + self.config.init_gas_limit;
        self.config.liquidity_value.as_u256() + U256::from(gas) * U256::from(gas_price)
    }

    /// Fail before any transaction if the deployer cannot fund the whole run
    async fn preflight<E: DeployEnvironment>(&self, env: &E) -> Result<(), ScriptError> {
        let deployer = env.deployer();
        let available = env.balance(deployer).await?;
        let gas_price = env.gas_price().await?;
        let required = self.required_funds(gas_price);
        if available < required {
            return Err(ScriptError::InsufficientFunds(format!(
                "deployer {deployer:#x} holds {available} wei, the run needs {required} wei \
                 of liquidity and gas at {gas_price} wei per gas"
            )));
        }

        let chain_id = env.chain_id().await?;
        if self.config.recipient == DEFAULT_RECIPIENT && !is_local_chain(chain_id) {
            warn!(
                "sending Balloons to the default recipient {DEFAULT_RECIPIENT:#x} on chain \
                 {chain_id}, set a recipient to change this"
            );
        }

        Ok(())
    }
}

impl DeployUnit for BalloonsDexDeployment {
    type Output = BalloonsDexOutcome;

    fn id(&self) -> &'static str {
        "balloons-dex"
    }

    fn tags(&self) -> &'static [&'static str] {
        &BALLOONS_DEX_TAGS
    }

    async fn run<E: DeployEnvironment>(
        &self,
        env: &E,
        deployments: &mut Deployments,
    ) -> Result<Self::Output, ScriptError> {
        info!("running {} [{}]", self.id(), self.tags().iter().join(", "));
        self.preflight(env).await?;

        // Deploy the token, then read its address back from the deployments
        deploy_contract(
            env,
            deployments,
            &self.artifacts,
            &self.config,
            BALLOONS_CONTRACT_NAME,
            vec![],
            vec![],
        )
        .await?;
        let balloons = Balloons::new(deployments.address(BALLOONS_CONTRACT_NAME)?, env);

        // Deploy the exchange, trading against the token
        deploy_contract(
            env,
            deployments,
            &self.artifacts,
            &self.config,
            DEX_CONTRACT_NAME,
            balloons.address().abi_encode(),
            vec![format!("{:#x}", balloons.address())],
        )
        .await?;
        let dex = Dex::new(deployments.address(DEX_CONTRACT_NAME)?, env);

        info!(
            "sending {} Balloon base units to {:#x}...",
            self.config.recipient_amount, self.config.recipient
        );
        let recipient_transfer = balloons
            .transfer(self.config.recipient, self.config.recipient_amount)
            .await?;

        info!(
            "Approving DEX ({:#x}) to take Balloons from main account...",
            dex.address()
        );
        let approval = balloons.approve(dex.address(), self.config.liquidity_tokens).await?;

        info!("INIT exchange...");
        let init = dex
            .init(
                self.config.liquidity_tokens,
                self.config.liquidity_value,
                self.config.init_gas_limit,
            )
            .await?;

        Ok(BalloonsDexOutcome {
            balloons: balloons.address(),
            dex: dex.address(),
            recipient_transfer,
            approval,
            init,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::SolCall;

    use super::{BalloonsDexDeployment, DeployUnit};
    use crate::{
        artifacts::{Artifact, Artifacts},
        config::{DeployConfig, ResolvedConfig},
        constants::{BALLOONS_CONTRACT_NAME, DEX_CONTRACT_NAME},
        contracts::{Balloons, Dex},
        deployments::Deployments,
        environment::DeployEnvironment,
        errors::ScriptError,
        solidity::{IBalloons, IDex},
        test_helpers::{gas_cost, MockLedger, DEPLOY_GAS, MOCK_CHAIN_ID, MOCK_GAS_PRICE},
    };

    /// The Balloons artifact used in the tests
    const BALLOONS_ARTIFACT: &str = r#"{ "abi": [], "bytecode": "0x6080604052" }"#;

    /// The DEX artifact used in the tests
    const DEX_ARTIFACT: &str = r#"{
        "abi": [{
            "type": "constructor",
            "inputs": [{ "name": "token_addr", "type": "address" }],
            "stateMutability": "nonpayable"
        }],
        "bytecode": "0x6080604053"
    }"#;

    /// The artifacts for both contracts
    fn artifacts() -> Artifacts {
        [
            Artifact::from_json(BALLOONS_CONTRACT_NAME, BALLOONS_ARTIFACT).unwrap(),
            Artifact::from_json(DEX_CONTRACT_NAME, DEX_ARTIFACT).unwrap(),
        ]
        .into_iter()
        .collect()
    }

    /// The default deployment parameters
    fn config() -> ResolvedConfig {
        DeployConfig::default().resolve().unwrap()
    }

    /// The deployer used in the tests
    fn deployer() -> Address {
        Address::repeat_byte(0xde)
    }

    #[tokio::test]
    async fn test_full_deployment() {
        let ledger = MockLedger::with_ether(deployer(), "100");
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let config = config();

        let unit = BalloonsDexDeployment::new(config.clone(), artifacts());
        let outcome = unit.run(&ledger, &mut deployments).await.unwrap();

        // Both contracts exist at distinct, non-zero addresses
        assert!(!outcome.balloons.is_zero());
        assert!(!outcome.dex.is_zero());
        assert_ne!(outcome.balloons, outcome.dex);
        assert_eq!(deployments.address(BALLOONS_CONTRACT_NAME).unwrap(), outcome.balloons);
        assert_eq!(deployments.address(DEX_CONTRACT_NAME).unwrap(), outcome.dex);

        // The DEX was deployed against the token
        let dex_record = deployments.get(DEX_CONTRACT_NAME).unwrap();
        assert_eq!(dex_record.args, vec![format!("{:#x}", outcome.balloons)]);

        let balloons = Balloons::new(outcome.balloons, &ledger);
        let dex = Dex::new(outcome.dex, &ledger);

        // The recipient holds exactly 10 Balloons
        let recipient_balance = balloons.balance_of(config.recipient).await.unwrap();
        assert_eq!(recipient_balance, U256::from(10u128.pow(19)));

        // The DEX holds 0.1 Balloons and 0.1 ether
        let seed = U256::from(10u128.pow(17));
        assert_eq!(balloons.balance_of(outcome.dex).await.unwrap(), seed);
        assert_eq!(dex.native_reserve().await.unwrap(), seed);
        assert_eq!(dex.total_liquidity().await.unwrap(), seed);
        assert_eq!(dex.liquidity(deployer()).await.unwrap(), seed);

        // The allowance was fully consumed by `init`
        assert_eq!(balloons.allowance(deployer(), outcome.dex).await.unwrap(), U256::ZERO);
    }

    #[tokio::test]
    async fn test_calls_run_in_order() {
        let ledger = MockLedger::with_ether(deployer(), "100");
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);

        let unit = BalloonsDexDeployment::new(config(), artifacts());
        let outcome = unit.run(&ledger, &mut deployments).await.unwrap();

        let calls = ledger.sent_calls();
        let sequence: Vec<_> = calls.iter().map(|c| (c.to, c.selector)).collect();
        assert_eq!(
            sequence,
            vec![
                (outcome.balloons, IBalloons::transferCall::SELECTOR),
                (outcome.balloons, IBalloons::approveCall::SELECTOR),
                (outcome.dex, IDex::initCall::SELECTOR),
            ]
        );
        assert_eq!(calls[2].value, U256::from(10u128.pow(17)));
    }

    #[tokio::test]
    async fn test_second_init_is_rejected() {
        let ledger = MockLedger::with_ether(deployer(), "100");
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let config = config();

        let unit = BalloonsDexDeployment::new(config.clone(), artifacts());
        let outcome = unit.run(&ledger, &mut deployments).await.unwrap();

        let balloons = Balloons::new(outcome.balloons, &ledger);
        let dex = Dex::new(outcome.dex, &ledger);
        balloons.approve(outcome.dex, config.liquidity_tokens).await.unwrap();

        let err = dex
            .init(config.liquidity_tokens, config.liquidity_value, config.init_gas_limit)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already has liquidity"));

        // The reserves are untouched
        let seed = U256::from(10u128.pow(17));
        assert_eq!(balloons.balance_of(outcome.dex).await.unwrap(), seed);
        assert_eq!(dex.native_reserve().await.unwrap(), seed);
    }

    #[tokio::test]
    async fn test_unfunded_deployer_fails_before_any_call() {
        // Enough for gas, but not for the ether the DEX is seeded with
        let ledger = MockLedger::new(deployer(), gas_cost(DEPLOY_GAS) * U256::from(2));
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);

        let unit = BalloonsDexDeployment::new(config(), artifacts());
        let err = unit.run(&ledger, &mut deployments).await.unwrap_err();

        assert!(matches!(err, ScriptError::InsufficientFunds(_)));
        assert_eq!(ledger.num_contracts(), 0);
        assert!(ledger.sent_calls().is_empty());
        assert!(deployments.get(BALLOONS_CONTRACT_NAME).is_none());
    }

    #[tokio::test]
    async fn test_gas_shortfall_fails_before_any_call() {
        // Covers both deployments and the seed value, but not the gas of the
        // token calls and `init`
        let seed = U256::from(10u128.pow(17));
        let ledger = MockLedger::new(deployer(), seed + gas_cost(DEPLOY_GAS) * U256::from(2));
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);

        let unit = BalloonsDexDeployment::new(config(), artifacts());
        let err = unit.run(&ledger, &mut deployments).await.unwrap_err();

        assert!(matches!(err, ScriptError::InsufficientFunds(_)));
        assert_eq!(ledger.num_contracts(), 0);
        assert!(ledger.sent_calls().is_empty());
        assert!(deployments.get(BALLOONS_CONTRACT_NAME).is_none());
    }

    #[tokio::test]
    async fn test_exact_required_funds_suffice() {
        let unit = BalloonsDexDeployment::new(config(), artifacts());
        let required = unit.required_funds(MOCK_GAS_PRICE.into());

        // One wei short is rejected up front
        let ledger = MockLedger::new(deployer(), required - U256::from(1));
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let err = unit.run(&ledger, &mut deployments).await.unwrap_err();
        assert!(matches!(err, ScriptError::InsufficientFunds(_)));
        assert_eq!(ledger.num_contracts(), 0);

        let ledger = MockLedger::new(deployer(), required);
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let outcome = unit.run(&ledger, &mut deployments).await.unwrap();
        assert_eq!(ledger.sent_calls().len(), 3);
        assert!(!outcome.dex.is_zero());
    }

    #[tokio::test]
    async fn test_missing_artifact() {
        let ledger = MockLedger::with_ether(deployer(), "100");
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let artifacts: Artifacts =
            [Artifact::from_json(BALLOONS_CONTRACT_NAME, BALLOONS_ARTIFACT).unwrap()]
                .into_iter()
                .collect();

        let unit = BalloonsDexDeployment::new(config(), artifacts);
        let err = unit.run(&ledger, &mut deployments).await.unwrap_err();

        assert!(matches!(err, ScriptError::ArtifactParsing(_)));
        assert_eq!(ledger.num_contracts(), 1);
    }

    #[tokio::test]
    async fn test_custom_recipient() {
        let ledger = MockLedger::with_ether(deployer(), "100");
        let mut deployments = Deployments::in_memory(MOCK_CHAIN_ID);
        let recipient = Address::repeat_byte(0x42);
        let config = DeployConfig {
            recipient,
            recipient_amount: "3.5".to_string(),
            ..Default::default()
        }
        .resolve()
        .unwrap();

        let unit = BalloonsDexDeployment::new(config, artifacts());
        let outcome = unit.run(&ledger, &mut deployments).await.unwrap();

        let balloons = Balloons::new(outcome.balloons, &ledger);
        let expected = U256::from(35u128 * 10u128.pow(17));
        assert_eq!(balloons.balance_of(recipient).await.unwrap(), expected);
        assert_eq!(ledger.deployer(), deployer());
    }

    #[test]
    fn test_tag_selection() {
        let unit = BalloonsDexDeployment::new(config(), Artifacts::default());

        assert!(unit.selected_by(&[]));
        assert!(unit.selected_by(&["DEX".to_string()]));
        assert!(unit.selected_by(&["Other".to_string(), "Balloons".to_string()]));
        assert!(!unit.selected_by(&["Other".to_string()]));
        assert!(!unit.selected_by(&["dex".to_string()]));
    }
}
