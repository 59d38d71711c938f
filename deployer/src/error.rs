use alloy::primitives::{Address, TxHash};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("artifact for contract {name} not found under {}", root.display())]
    NotFound { name: String, root: PathBuf },

    #[error("contract name {name} is ambiguous, use a fully qualified name: {candidates:?}")]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },

    #[error("contract {0} is abstract and can't be deployed")]
    AbstractContract(String),

    #[error("contract {name} has unlinked libraries: {libraries:?}")]
    UnlinkedLibraries {
        name: String,
        libraries: Vec<String>,
    },

    #[error("contract {0} expects constructor arguments")]
    MissingConstructorArgs(String),

    #[error("contract {0} has no constructor inputs but arguments were given")]
    UnexpectedConstructorArgs(String),

    #[error("invalid bytecode in artifact {name}: {source}")]
    InvalidBytecode {
        name: String,
        #[source]
        source: alloy::hex::FromHexError,
    },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode artifact {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("no signer at index {index}, {available} available")]
    MissingSigner { index: usize, available: usize },

    #[error("deployment transaction {0} reverted")]
    Reverted(TxHash),

    #[error("receipt of {tx_hash} reports contract at {actual:?}, expected {expected}")]
    UnexpectedAddress {
        tx_hash: TxHash,
        expected: Address,
        actual: Option<Address>,
    },

    #[error("node reports chain id {actual}, configured {expected}")]
    WrongChain { expected: u64, actual: u64 },
}

#[derive(Error, Debug)]
pub enum DeploymentsError {
    #[error("deployments for {network} belong to chain {stored}, node is on chain {actual}")]
    ChainIdMismatch {
        network: String,
        stored: u64,
        actual: u64,
    },

    #[error("malformed chain id file {}", .0.display())]
    MalformedChainId(PathBuf),
}
