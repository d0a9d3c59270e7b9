//! # kyc-cli: Command-Line Tool for the KYC Credential Pipeline
//!
//! Provides the `kyc` command-line interface.
//!
//! ## Subcommands
//!
//! - `kyc issue`: Issue a credential from a YAML or JSON payload file.
//! - `kyc flow`: Drive an Identity, Human or Age verification session
//!   end to end against the simulated chain.
//! - `kyc verify-proof`: Check an inclusion proof offline.
//!
//! ```bash
//! kyc issue payload.yaml --proof-out proof.json
//! kyc flow age --holder 0x742d... --range over-21 --method government-id
//! kyc verify-proof proof.json
//! ```

pub mod flow;
pub mod issue;
pub mod proof;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;

use kyc_chain::{ChainConfig, SimulatedChain};
use kyc_issuance::{CredentialLifecycleManager, IssuerRegistry, LifecycleConfig};
use kyc_state::Credential;

/// Chain options shared by subcommands that issue credentials.
#[derive(Args, Debug, Clone, Default)]
pub struct ChainArgs {
    /// Simulated confirmation latency in milliseconds. Defaults to
    /// `KYC_CHAIN_LATENCY_MS`, or 1500.
    #[arg(long, value_name = "MS")]
    pub latency_ms: Option<u64>,
}

/// A lifecycle manager wired to a simulated chain.
pub struct Pipeline {
    pub manager: CredentialLifecycleManager,
    pub chain: ChainConfig,
}

impl Pipeline {
    /// Build from the environment, applying command-line overrides.
    pub fn from_env(args: &ChainArgs) -> Result<Self> {
        let mut chain = ChainConfig::from_env().context("invalid chain configuration")?;
        if let Some(ms) = args.latency_ms {
            chain.latency = Duration::from_millis(ms);
        }
        let lifecycle = LifecycleConfig::from_env().context("invalid lifecycle configuration")?;
        let issuers = IssuerRegistry::builtin().context("failed to load built-in issuers")?;
        tracing::debug!(network = %chain.network, latency = ?chain.latency, "simulated chain ready");

        let manager = CredentialLifecycleManager::new(
            lifecycle,
            Arc::new(SimulatedChain::new(&chain)),
            issuers,
        );
        Ok(Self { manager, chain })
    }
}

/// Run a future to completion on a fresh single-threaded runtime.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}

/// Parse a YAML or JSON document, chosen by file extension.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        anyhow::bail!("file not found: {}", path.display());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse YAML: {}", path.display()))
    }
}

/// Print an issued credential.
pub fn report(credential: &Credential, chain: &ChainConfig) {
    println!(
        "OK: issued {} credential {}",
        credential.credential_type, credential.id
    );
    println!("  holder:      {}", credential.holder);
    println!("  status:      {}", credential.status);
    println!("  expires:     {}", credential.expiry_time);
    println!("  tx:          {}", credential.tx_ref);
    if let Ok(url) = chain.explorer_url(&credential.tx_ref) {
        println!("  explorer:    {url}");
    }
    println!("  leaf index:  {}", credential.leaf_index);
    println!("  merkle leaf: {}", credential.merkle_leaf);
    println!("  root:        {}", credential.root_at_issuance);
    if let Some(summary) = &credential.proof_summary {
        println!("  proof:       {summary}");
    }
}
