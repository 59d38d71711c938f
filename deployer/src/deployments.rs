use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

use crate::{error::DeploymentsError, runtime::DeployedContract};

const CHAIN_ID_FILE: &str = ".chainId";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    pub deployer: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub network: String,
    pub chain_id: u64,
    pub deployed_at: String,
    pub abi: Value,
}

impl DeploymentRecord {
    pub fn new(deployed: DeployedContract, network: &str, chain_id: u64) -> Result<Self> {
        Ok(Self {
            contract_name: deployed.contract_name,
            address: deployed.address,
            deployer: deployed.deployer,
            transaction_hash: deployed.transaction_hash,
            block_number: deployed.block_number,
            gas_used: deployed.gas_used,
            network: network.to_string(),
            chain_id,
            deployed_at: OffsetDateTime::now_utc().format(&Rfc3339)?,
            abi: deployed.abi,
        })
    }
}

/// Deployment records of one network, one JSON file per contract.
pub struct Deployments {
    root_dir: PathBuf,
}

impl Deployments {
    pub fn open(root_dir: &Path, network: &str, chain_id: u64) -> Result<Self> {
        let root_dir = root_dir.join(network);
        fs::create_dir_all(&root_dir)?;

        let chain_id_path = root_dir.join(CHAIN_ID_FILE);
        if chain_id_path.exists() {
            let stored: u64 = fs::read_to_string(&chain_id_path)?
                .trim()
                .parse()
                .map_err(|_| DeploymentsError::MalformedChainId(chain_id_path.clone()))?;
            if stored != chain_id {
                return Err(DeploymentsError::ChainIdMismatch {
                    network: network.to_string(),
                    stored,
                    actual: chain_id,
                }
                .into());
            }
        } else {
            fs::write(&chain_id_path, chain_id.to_string())?;
        }

        Ok(Self { root_dir })
    }

    fn record_path(&self, contract_name: &str) -> PathBuf {
        // Fully qualified names carry the source path.
        let file_name = contract_name.rsplit(':').next().unwrap_or(contract_name);
        self.root_dir.join(format!("{file_name}.json"))
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<PathBuf> {
        let path = self.record_path(&record.contract_name);
        info!("Saving deployment record to: {:#}", path.display());
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, record)?;
        Ok(path)
    }

    pub fn load(&self, contract_name: &str) -> Result<DeploymentRecord> {
        let path = self.record_path(contract_name);
        info!("Loading deployment record from: {:#}", path.display());
        let file = fs::File::open(path)?;
        let record = serde_json::from_reader(file)?;
        Ok(record)
    }
}
