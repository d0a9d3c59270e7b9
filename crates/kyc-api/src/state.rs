//! # Application State
//!
//! Shared state for the Axum application. All credential data lives inside
//! the [`CredentialLifecycleManager`]; the state adds the chain
//! configuration needed to render explorer links.

use std::sync::Arc;

use thiserror::Error;

use kyc_chain::{ChainConfig, SimulatedChain};
use kyc_issuance::{CredentialLifecycleManager, IssuerRegistry, LifecycleConfig};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Validity window and submission timeout.
    pub lifecycle: LifecycleConfig,
    /// Network, simulated latency and explorer base.
    pub chain: ChainConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// `PORT` (default 8080) plus the variables read by
    /// [`LifecycleConfig::from_env`] and [`ChainConfig::from_env`].
    pub fn from_env() -> Result<Self, BootstrapError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| BootstrapError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self {
            port,
            lifecycle: LifecycleConfig::from_env()?,
            chain: ChainConfig::from_env()?,
        })
    }
}

/// Errors while assembling the application state.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("PORT must be a valid port number, got {0:?}")]
    InvalidPort(String),
    #[error("lifecycle configuration: {0}")]
    Lifecycle(#[from] kyc_issuance::ConfigError),
    #[error("chain configuration: {0}")]
    Chain(#[from] kyc_chain::ConfigError),
    #[error("issuer registry: {0}")]
    Issuers(#[from] kyc_core::ValidationError),
}

/// Shared application state, cheap to clone into handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub manager: CredentialLifecycleManager,
    pub chain: Arc<ChainConfig>,
}

impl AppState {
    pub fn new(manager: CredentialLifecycleManager, chain: ChainConfig) -> Self {
        Self {
            manager,
            chain: Arc::new(chain),
        }
    }

    /// Wire a manager to a simulated chain and the built-in issuers.
    pub fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        let submitter = Arc::new(SimulatedChain::new(&config.chain));
        let manager = CredentialLifecycleManager::new(
            config.lifecycle,
            submitter,
            IssuerRegistry::builtin()?,
        );
        Ok(Self::new(manager, config.chain.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_uses_the_configured_network() {
        let config = AppConfig {
            port: DEFAULT_PORT,
            lifecycle: LifecycleConfig::default(),
            chain: ChainConfig::instant().unwrap(),
        };
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.manager.network(), "polygon");
        assert_eq!(state.manager.issuers().len(), 3);
    }
}
