//! Runs against a local anvil node: `anvil` then
//! `cargo test -p deployer --features node_test`.
#![cfg(feature = "node_test")]

use alloy::providers::Provider;
use anyhow::Result;
use clap::Parser;
use deployer::{
    cli::DeployConfig,
    deployments::Deployments,
    env::{create_node_provider, create_provider, create_wallet},
    error::DeployError,
    run,
};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

static ANVIL_PRIVATE_KEYS: [&str; 2] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
];

static ANVIL_CHAIN_ID: &str = "31337";

// Creation code for a contract whose runtime returns 42.
static INIT_CODE: &str = "0x600a600c600039600a6000f3602a60005260206000f3";

// Creation code that reverts immediately.
static REVERTING_INIT_CODE: &str = "0x60006000fd";

fn workspace() -> TempDir {
    workspace_with(INIT_CODE)
}

fn workspace_with(init_code: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    let artifact = dir
        .path()
        .join("artifacts/contracts/MarketplaceContract.sol/MarketplaceContract.json");
    fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    let contents = json!({
        "_format": "hh-sol-artifact-1",
        "contractName": "MarketplaceContract",
        "sourceName": "contracts/MarketplaceContract.sol",
        "abi": [],
        "bytecode": init_code,
        "deployedBytecode": "0x602a60005260206000f3",
        "linkReferences": {},
        "deployedLinkReferences": {}
    });
    fs::write(artifact, contents.to_string()).unwrap();
    dir
}

fn config(dir: &TempDir, extra: &[&str]) -> DeployConfig {
    let artifacts = dir.path().join("artifacts");
    let deployments = dir.path().join("deployments");
    let mut args = vec![
        "deploy".to_string(),
        "--chain-id".to_string(),
        ANVIL_CHAIN_ID.to_string(),
        "--artifacts-dir".to_string(),
        artifacts.display().to_string(),
        "--deployments-dir".to_string(),
        deployments.display().to_string(),
    ];
    args.extend(extra.iter().map(|arg| arg.to_string()));
    DeployConfig::try_parse_from(args).unwrap()
}

#[tokio::test]
async fn deploys_with_local_keys() -> Result<()> {
    let dir = workspace();
    let keys = ANVIL_PRIVATE_KEYS.join(",");
    let config = config(&dir, &["--private-keys", &keys, "--deployer-index", "1"]);

    let signers = config.base.signers()?;
    let addresses: Vec<_> = signers.iter().map(|s| s.address()).collect();
    let provider = create_provider(config.node_url()?, create_wallet(&signers).unwrap());
    let record = run(&config, provider.clone(), addresses.clone()).await?;

    assert_eq!(record.deployer, addresses[1]);
    let code = provider.get_code_at(record.address).await?;
    assert_eq!(code.to_vec(), vec![0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3]);

    let deployments = Deployments::open(&dir.path().join("deployments"), "localhost", 31337)?;
    assert_eq!(deployments.load("MarketplaceContract")?, record);
    Ok(())
}

#[tokio::test]
async fn deploys_with_node_accounts() -> Result<()> {
    let dir = workspace();
    let config = config(&dir, &[]);

    let provider = create_node_provider(config.node_url()?);
    let accounts = provider.get_accounts().await?;
    let record = run(&config, provider, vec![]).await?;

    assert_eq!(record.deployer, accounts[0]);
    assert_eq!(record.contract_name, "MarketplaceContract");
    Ok(())
}

#[tokio::test]
async fn wrong_chain_is_refused() {
    let dir = workspace();
    let mut config = config(&dir, &[]);
    config.base.chain_id = Some(1);

    let provider = create_node_provider(config.node_url().unwrap());
    assert!(run(&config, provider, vec![]).await.is_err());
    assert!(!dir.path().join("deployments").exists());
}

#[tokio::test]
async fn reverted_deployment_is_an_error() {
    let dir = workspace_with(REVERTING_INIT_CODE);
    let config = config(&dir, &["--gas-limit", "100000"]);

    let provider = create_node_provider(config.node_url().unwrap());
    let err = run(&config, provider, vec![]).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DeployError>(),
        Some(DeployError::Reverted(_))
    ));
    assert!(!dir
        .path()
        .join("deployments/localhost/MarketplaceContract.json")
        .exists());
}

#[tokio::test]
async fn zero_confirmations_still_waits_for_receipt() -> Result<()> {
    let dir = workspace();
    let config = config(&dir, &["--confirmations", "0", "--timeout-secs", "30"]);

    let provider = create_node_provider(config.node_url()?);
    let record = run(&config, provider.clone(), vec![]).await?;

    assert!(record.block_number.is_some());
    assert!(!provider.get_code_at(record.address).await?.is_empty());
    assert!(dir
        .path()
        .join("deployments/localhost/MarketplaceContract.json")
        .exists());
    Ok(())
}
