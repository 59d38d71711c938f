use alloy::{hex, primitives::Bytes, signers::local::PrivateKeySigner};
use clap::Parser;
use serde::Serialize;
use std::{str::FromStr, time::Duration};
use url::Url;

use crate::{runtime::FactoryOptions, script::MARKETPLACE_CONTRACT};

#[derive(Clone, Parser, Serialize)]
pub struct BaseConfig {
    #[arg(long, env = "NODE_PROTOCOL", default_value = "http")]
    pub node_protocol: String,

    /// Node host
    #[arg(long, env = "NODE_HOST", default_value = "localhost")]
    pub node_host: String,

    /// Node port
    #[arg(long, env = "NODE_PORT", default_value = "8545")]
    pub node_port: String,

    /// Signer private keys (with or without 0x prefix), comma separated.
    /// Without keys the node's unlocked accounts are used.
    #[arg(long, env = "PRIVATE_KEYS", value_delimiter = ',')]
    #[serde(skip_serializing)]
    pub private_keys: Vec<String>,

    /// Expected chain ID, checked against the node before deploying
    #[arg(long, env = "CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Network name, used for the deployments folder
    #[arg(long, env = "NETWORK", default_value = "localhost")]
    pub network: String,

    /// Path to compiled contract artifacts
    #[arg(long, env = "ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts_dir: String,

    /// Path to deployment records
    #[arg(long, env = "DEPLOYMENTS_DIR", default_value = "deployments")]
    pub deployments_dir: String,
}

impl BaseConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        let node_url = format!(
            "{}://{}:{}",
            self.node_protocol, self.node_host, self.node_port
        );
        Url::parse(&node_url)
    }

    pub fn signers(&self) -> anyhow::Result<Vec<PrivateKeySigner>> {
        self.private_keys
            .iter()
            .map(|key| Ok(PrivateKeySigner::from_str(key.trim())?))
            .collect()
    }
}

#[derive(Clone, Parser, Serialize)]
#[command(author, version, about = "Deploy the marketplace contract", long_about = None)]
pub struct DeployConfig {
    #[clap(flatten)]
    pub base: BaseConfig,

    /// Contract name, bare or fully qualified (path/to/Source.sol:Name)
    #[arg(long, env = "CONTRACT_NAME", default_value = MARKETPLACE_CONTRACT)]
    pub contract: String,

    #[arg(long, env = "DEPLOYER_INDEX", default_value_t = 0)]
    pub deployer_index: usize,

    /// ABI encoded constructor arguments as hex
    #[arg(long, env = "CONSTRUCTOR_ARGS")]
    pub constructor_args: Option<String>,

    /// Gas limit for the creation transaction, estimated when unset
    #[arg(long, env = "GAS_LIMIT")]
    pub gas_limit: Option<u64>,

    #[arg(long, env = "CONFIRMATIONS", default_value_t = 1)]
    pub confirmations: u64,

    #[arg(long, env = "DEPLOY_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

impl DeployConfig {
    pub fn node_url(&self) -> Result<Url, url::ParseError> {
        self.base.node_url()
    }

    pub fn factory_options(&self) -> Result<FactoryOptions, hex::FromHexError> {
        let constructor_args = match &self.constructor_args {
            Some(args) => Bytes::from(hex::decode(args.trim())?),
            None => Bytes::new(),
        };
        Ok(FactoryOptions {
            constructor_args,
            gas_limit: self.gas_limit,
            confirmations: self.confirmations,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn explicit_flags() {
        let config = DeployConfig::try_parse_from([
            "deploy",
            "--node-host",
            "10.0.0.5",
            "--node-port",
            "9545",
            "--private-keys",
            &format!("{ANVIL_KEY}, {ANVIL_KEY}"),
            "--constructor-args",
            "0x0000000000000000000000000000000000000000000000000000000000000001",
            "--timeout-secs",
            "30",
            "--deployer-index",
            "1",
        ])
        .unwrap();

        assert_eq!(config.node_url().unwrap().as_str(), "http://10.0.0.5:9545/");
        assert_eq!(config.deployer_index, 1);

        let signers = config.base.signers().unwrap();
        assert_eq!(signers.len(), 2);
        assert_eq!(
            signers[0].address().to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );

        let options = config.factory_options().unwrap();
        assert_eq!(options.constructor_args.len(), 32);
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn private_keys_are_not_logged() {
        let config =
            DeployConfig::try_parse_from(["deploy", "--private-keys", ANVIL_KEY]).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains(&ANVIL_KEY[2..]));
    }

    #[test]
    fn bad_inputs_are_errors() {
        let config = DeployConfig::try_parse_from([
            "deploy",
            "--private-keys",
            "not-a-key",
            "--constructor-args",
            "0xzz",
        ])
        .unwrap();
        assert!(config.base.signers().is_err());
        assert!(config.factory_options().is_err());
    }
}
