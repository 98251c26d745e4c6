//! Implementations of the various deploy scripts

use std::path::Path;

use itertools::Itertools;
use tracing::info;

use crate::{
    cli::{DeployArgs, VerifyArgs},
    constants::ETHER_DECIMALS,
    deployments::Deployments,
    environment::DeployEnvironment,
    errors::ScriptError,
    script::{BalloonsDexDeployment, DeployUnit},
    units::TokenAmount,
    verify::inspect,
};

/// Deploy the Balloons token and the DEX, unless excluded by the requested tags
pub async fn deploy<E: DeployEnvironment>(
    args: DeployArgs,
    env: &E,
    deployments_dir: &Path,
) -> Result<(), ScriptError> {
    let config = args.params.resolve()?;
    let mut unit = BalloonsDexDeployment::new(config, Default::default());
    if !unit.selected_by(&args.tags) {
        info!(
            "skipping {}, not selected by tags [{}]",
            unit.id(),
            args.tags.iter().join(", ")
        );
        return Ok(());
    }
    unit.load_artifacts(&args.artifacts_dir)?;

    let chain_id = env.chain_id().await?;
    let mut deployments = Deployments::open(deployments_dir, chain_id)?;
    let outcome = unit.run(env, &mut deployments).await?;

    info!("Balloons deployed at {:#x}", outcome.balloons);
    info!("DEX deployed at {:#x}", outcome.dex);
    info!("DEX initialized in tx {:#x}", outcome.init.transaction_hash);
    if let Some(path) = deployments.path() {
        info!(
            "deployments for chain {} written to {}",
            deployments.chain_id(),
            path.display()
        );
    }

    Ok(())
}

/// Check the recorded deployment against the state a fresh deployment leaves
pub async fn verify<E: DeployEnvironment>(
    args: VerifyArgs,
    env: &E,
    deployments_dir: &Path,
) -> eyre::Result<()> {
    let config = args.params.resolve()?;
    let chain_id = env.chain_id().await?;
    let deployments = Deployments::open(deployments_dir, chain_id)?;

    let report = inspect(env, &deployments, config.recipient).await?;
    info!("deployment on chain {chain_id}:\n{report}");
    report.check(&config)?;

    info!("deployment matches the expected state");
    Ok(())
}

/// Log the deployer's address and balance
pub async fn account<E: DeployEnvironment>(env: &E) -> Result<(), ScriptError> {
    let deployer = env.deployer();
    let chain_id = env.chain_id().await?;
    let balance = TokenAmount::from_base_units(env.balance(deployer).await?);

    info!(
        "deployer {deployer:#x} holds {} ether on chain {chain_id}",
        balance.format(ETHER_DECIMALS)
    );
    Ok(())
}
