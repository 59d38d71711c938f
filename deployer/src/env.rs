use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::{Client, Http},
};
use time::macros::format_description;
use tracing_subscriber::{
    fmt::{format::FmtSpan, time::UtcTime},
    EnvFilter,
};
use url::Url;

/// Initialize the console subscriber for logging
pub fn init_console_subscriber() {
    let timer = UtcTime::new(format_description!(
        "[year]-[month]-[day]T[hour repr:24]:[minute]:[second].[subsecond digits:3]Z"
    ));
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(timer)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_level(true)
        .with_ansi(true)
        .with_writer(std::io::stdout)
        .init();
}

/// Every signer is registered with the wallet; the first one is the default.
pub fn create_wallet(signers: &[PrivateKeySigner]) -> Option<EthereumWallet> {
    let (first, rest) = signers.split_first()?;
    let mut wallet = EthereumWallet::from(first.clone());
    for signer in rest {
        wallet.register_signer(signer.clone());
    }
    Some(wallet)
}

pub fn create_provider(
    node_url: Url,
    wallet: EthereumWallet,
) -> impl Provider<Http<Client>, Ethereum> + Clone {
    ProviderBuilder::new()
        .with_recommended_fillers() // Add recommended fillers for nonce, gas, etc.
        .wallet(wallet)
        .on_http(node_url)
}

/// Provider for nodes that sign with their own unlocked accounts.
pub fn create_node_provider(node_url: Url) -> impl Provider<Http<Client>, Ethereum> + Clone {
    ProviderBuilder::new()
        .with_recommended_fillers()
        .on_http(node_url)
}
