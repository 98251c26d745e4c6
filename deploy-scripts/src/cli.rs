//! Definitions of CLI arguments and commands for deploy scripts

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    commands::{account, deploy, verify},
    config::{DeployConfig, ResolvedConfig},
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_DEPLOYMENTS_DIR, DEFAULT_DEVNET_HOSTPORT,
        DEFAULT_DEVNET_PKEY,
    },
    environment::DeployEnvironment,
    errors::ScriptError,
};

/// Deploys the Balloons token and the DEX, and seeds the DEX with liquidity
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer, defaults to the first Hardhat / Anvil
    /// development account
    #[arg(
        short,
        long,
        env = "DEPLOYER_PRIVATE_KEY",
        default_value = DEFAULT_DEVNET_PKEY,
        hide_default_value = true,
        hide_env_values = true
    )]
    pub priv_key: String,

    /// Network RPC URL
    #[arg(short, long, env = "RPC_URL", default_value = DEFAULT_DEVNET_HOSTPORT)]
    pub rpc_url: String,

    /// Directory holding the per-chain deployments files
    #[arg(long, default_value = DEFAULT_DEPLOYMENTS_DIR)]
    pub deployments_dir: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The commands the scripts can run
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the contracts and initialize the DEX
    Deploy(DeployArgs),
    /// Check the recorded deployment against the expected on-chain state
    Verify(VerifyArgs),
    /// Show the deployer account and its balance
    Account,
}

impl Command {
    /// Run the command against `env`
    pub async fn run<E: DeployEnvironment>(
        self,
        env: &E,
        deployments_dir: &Path,
    ) -> eyre::Result<()> {
        match self {
            Command::Deploy(args) => deploy(args, env, deployments_dir).await?,
            Command::Verify(args) => verify(args, env, deployments_dir).await?,
            Command::Account => account(env).await?,
        }

        Ok(())
    }
}

/// Arguments selecting the deployment parameters
#[derive(Args, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a TOML file overriding the default deployment parameters
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address that receives the initial Balloons, takes precedence over the
    /// config file
    #[arg(long)]
    pub recipient: Option<Address>,
}

impl ConfigArgs {
    /// Load and validate the deployment parameters
    pub fn resolve(&self) -> Result<ResolvedConfig, ScriptError> {
        let mut config = DeployConfig::load(self.config.as_deref())?;
        if let Some(recipient) = self.recipient {
            config.recipient = recipient;
        }

        config.resolve()
    }
}

/// Deploy the Balloons token and the DEX
#[derive(Args, Clone)]
pub struct DeployArgs {
    /// Directory holding the compiled contract artifacts
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts_dir: PathBuf,

    /// Only run deployments carrying one of these tags
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// The deployment parameters
    #[command(flatten)]
    pub params: ConfigArgs,
}

/// Check a recorded deployment
#[derive(Args, Clone, Default)]
pub struct VerifyArgs {
    /// The deployment parameters the deployment was run with
    #[command(flatten)]
    pub params: ConfigArgs,
}
