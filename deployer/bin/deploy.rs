use anyhow::Result;
use clap::Parser;
use deployer::{
    cli::DeployConfig,
    env::{create_node_provider, create_provider, create_wallet, init_console_subscriber},
    run,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_console_subscriber();
    let config = DeployConfig::parse();
    info!("{}", serde_json::to_string_pretty(&config)?);

    let node_url = config.node_url()?;
    let signers = config.base.signers()?;
    let addresses = signers.iter().map(|signer| signer.address()).collect();
    let record = match create_wallet(&signers) {
        Some(wallet) => run(&config, create_provider(node_url, wallet), addresses).await?,
        None => run(&config, create_node_provider(node_url), addresses).await?,
    };
    println!("{}", record.address);
    Ok(())
}
