use anyhow::Result;
use tracing::info;

use crate::{
    error::DeployError,
    runtime::{ContractFactory, DeployedContract, PendingDeployment, RuntimeEnvironment},
};

pub const MARKETPLACE_CONTRACT: &str = "MarketplaceContract";

/// Deploys `MarketplaceContract` from the first signer of the environment.
pub async fn deploy_marketplace_contract<E: RuntimeEnvironment>(
    env: &E,
) -> Result<DeployedContract> {
    deploy_contract(env, MARKETPLACE_CONTRACT, 0).await
}

pub async fn deploy_contract<E: RuntimeEnvironment>(
    env: &E,
    contract_name: &str,
    deployer_index: usize,
) -> Result<DeployedContract> {
    let accounts = env.signers().await?;
    let deployer = *accounts
        .get(deployer_index)
        .ok_or(DeployError::MissingSigner {
            index: deployer_index,
            available: accounts.len(),
        })?;
    info!("Deployer address: {:#}", deployer);

    let factory = env.contract_factory(contract_name, deployer).await?;
    let pending = factory.deploy().await?;
    info!(
        "{} will be deployed at {:#} (tx {})",
        contract_name,
        pending.address(),
        pending.transaction_hash()
    );
    info!("Deploying {}", contract_name);

    let deployed = pending.deployed().await?;
    info!("{} deployment finished", contract_name);
    Ok(deployed)
}
