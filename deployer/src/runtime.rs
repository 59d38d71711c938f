//! The environment the deployment procedure runs against.
//!
//! The procedure only sees the traits below, so it can be driven either by a
//! live node through alloy or by a mocked environment in tests.

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, TxHash},
    providers::{PendingTransactionBuilder, Provider},
    rpc::types::TransactionRequest,
    transports::http::{Client, Http},
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    artifact::{Artifact, ArtifactStore},
    error::DeployError,
};

/// A contract whose creation transaction has been mined.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployedContract {
    pub contract_name: String,
    pub address: Address,
    pub deployer: Address,
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub abi: Value,
}

#[async_trait]
pub trait RuntimeEnvironment: Send + Sync {
    type Factory: ContractFactory;

    /// Accounts available for signing on the configured network.
    async fn signers(&self) -> Result<Vec<Address>>;

    /// Binds the named contract artifact to `deployer` as sender.
    async fn contract_factory(&self, name: &str, deployer: Address) -> Result<Self::Factory>;
}

#[async_trait]
pub trait ContractFactory: Send + Sync {
    type Pending: PendingDeployment;

    /// Submits the contract creation transaction without waiting for it.
    async fn deploy(&self) -> Result<Self::Pending>;
}

#[async_trait]
pub trait PendingDeployment: Send {
    /// Address the contract lives at once the transaction is mined.
    fn address(&self) -> Address;

    fn transaction_hash(&self) -> TxHash;

    /// Waits for deployment confirmation.
    async fn deployed(self) -> Result<DeployedContract>;
}

#[derive(Clone, Debug, Default)]
pub struct FactoryOptions {
    pub constructor_args: Bytes,
    pub gas_limit: Option<u64>,
    pub confirmations: u64,
    pub timeout: Option<Duration>,
}

pub struct AlloyRuntime<P> {
    provider: P,
    local_signers: Vec<Address>,
    artifacts: ArtifactStore,
    options: FactoryOptions,
}

impl<P> AlloyRuntime<P>
where
    P: Provider<Http<Client>, Ethereum> + Clone + 'static,
{
    /// With no local signers the node's unlocked accounts are used.
    pub fn new(
        provider: P,
        local_signers: Vec<Address>,
        artifacts: ArtifactStore,
        options: FactoryOptions,
    ) -> Self {
        Self {
            provider,
            local_signers,
            artifacts,
            options,
        }
    }
}

#[async_trait]
impl<P> RuntimeEnvironment for AlloyRuntime<P>
where
    P: Provider<Http<Client>, Ethereum> + Clone + 'static,
{
    type Factory = AlloyContractFactory<P>;

    async fn signers(&self) -> Result<Vec<Address>> {
        if !self.local_signers.is_empty() {
            return Ok(self.local_signers.clone());
        }
        debug!("No local signers configured, asking node for accounts");
        Ok(self.provider.get_accounts().await?)
    }

    async fn contract_factory(&self, name: &str, deployer: Address) -> Result<Self::Factory> {
        debug!(
            "Resolving artifact {} under {}",
            name,
            self.artifacts.root().display()
        );
        let artifact = self.artifacts.find(name)?;
        let init_code = artifact.init_code(&self.options.constructor_args)?;
        Ok(AlloyContractFactory {
            provider: self.provider.clone(),
            artifact,
            deployer,
            init_code,
            options: self.options.clone(),
        })
    }
}

pub struct AlloyContractFactory<P> {
    provider: P,
    artifact: Artifact,
    deployer: Address,
    init_code: Bytes,
    options: FactoryOptions,
}

#[async_trait]
impl<P> ContractFactory for AlloyContractFactory<P>
where
    P: Provider<Http<Client>, Ethereum> + Clone + 'static,
{
    type Pending = AlloyPendingDeployment;

    async fn deploy(&self) -> Result<Self::Pending> {
        // The nonce is pinned so the address derived here is the one the
        // node assigns.
        let nonce = self
            .provider
            .get_transaction_count(self.deployer)
            .pending()
            .await?;
        let address = self.deployer.create(nonce);
        debug!("Deployer {} nonce {} -> {}", self.deployer, nonce, address);

        let mut tx = TransactionRequest::default()
            .with_from(self.deployer)
            .with_nonce(nonce)
            .with_deploy_code(self.init_code.clone());
        if let Some(gas_limit) = self.options.gas_limit {
            tx.set_gas_limit(gas_limit);
        }
        let pending = self.provider.send_transaction(tx).await?;

        Ok(AlloyPendingDeployment {
            contract_name: self.artifact.contract_name.clone(),
            abi: self.artifact.abi.clone(),
            deployer: self.deployer,
            address,
            confirmations: self.options.confirmations,
            timeout: self.options.timeout,
            pending,
        })
    }
}

pub struct AlloyPendingDeployment {
    contract_name: String,
    abi: Value,
    deployer: Address,
    address: Address,
    confirmations: u64,
    timeout: Option<Duration>,
    pending: PendingTransactionBuilder<Http<Client>, Ethereum>,
}

#[async_trait]
impl PendingDeployment for AlloyPendingDeployment {
    fn address(&self) -> Address {
        self.address
    }

    fn transaction_hash(&self) -> TxHash {
        *self.pending.tx_hash()
    }

    async fn deployed(self) -> Result<DeployedContract> {
        let transaction_hash = self.transaction_hash();
        let receipt = self
            .pending
            .with_required_confirmations(self.confirmations.max(1))
            .with_timeout(self.timeout)
            .get_receipt()
            .await?;

        check_receipt(
            transaction_hash,
            receipt.status(),
            self.address,
            receipt.contract_address,
        )?;

        Ok(DeployedContract {
            contract_name: self.contract_name,
            address: self.address,
            deployer: self.deployer,
            transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            abi: self.abi,
        })
    }
}

/// A creation receipt is accepted only if it succeeded and created the
/// contract at the derived address.
fn check_receipt(
    tx_hash: TxHash,
    status: bool,
    expected: Address,
    actual: Option<Address>,
) -> Result<(), DeployError> {
    if !status {
        return Err(DeployError::Reverted(tx_hash));
    }
    if actual != Some(expected) {
        return Err(DeployError::UnexpectedAddress {
            tx_hash,
            expected,
            actual,
        });
    }
    Ok(())
}
