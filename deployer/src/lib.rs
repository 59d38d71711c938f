use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::Provider,
    transports::http::{Client, Http},
};
use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::{
    artifact::ArtifactStore,
    cli::DeployConfig,
    deployments::{DeploymentRecord, Deployments},
    error::DeployError,
    runtime::AlloyRuntime,
};

pub mod artifact;
pub mod cli;
pub mod deployments;
pub mod env;
pub mod error;
pub mod runtime;
pub mod script;

/// Deploys the configured contract through `provider` and records it in the
/// deployments folder of the configured network.
pub async fn run<P>(
    config: &DeployConfig,
    provider: P,
    local_signers: Vec<Address>,
) -> Result<DeploymentRecord>
where
    P: Provider<Http<Client>, Ethereum> + Clone + 'static,
{
    let chain_id = provider.get_chain_id().await?;
    if let Some(expected) = config.base.chain_id {
        if expected != chain_id {
            return Err(DeployError::WrongChain {
                expected,
                actual: chain_id,
            }
            .into());
        }
    }
    info!("Connected to {} (chain {})", config.base.network, chain_id);

    let deployments = Deployments::open(
        Path::new(&config.base.deployments_dir),
        &config.base.network,
        chain_id,
    )?;
    let runtime = AlloyRuntime::new(
        provider,
        local_signers,
        ArtifactStore::new(&config.base.artifacts_dir),
        config.factory_options()?,
    );

    let deployed =
        script::deploy_contract(&runtime, &config.contract, config.deployer_index).await?;
    let record = DeploymentRecord::new(deployed, &config.base.network, chain_id)?;
    deployments.save(&record)?;
    Ok(record)
}
