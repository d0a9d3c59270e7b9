//! Chain configuration.
//!
//! Defaults reproduce the hosted demo: Polygon network naming, a 1.5 second
//! confirmation delay, and Polygonscan transaction links. Override through
//! environment variables or explicit construction for tests.

use std::time::Duration;

use url::Url;

use kyc_core::TxRef;

/// Default simulated confirmation latency.
pub const DEFAULT_LATENCY_MS: u64 = 1500;

/// Default explorer base for transaction links.
pub const DEFAULT_EXPLORER_URL: &str = "https://polygonscan.com/tx/";

/// Default network name.
pub const DEFAULT_NETWORK: &str = "polygon";

/// Configuration for the chain submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Network name, mixed into simulated transaction references.
    pub network: String,
    /// Simulated confirmation latency.
    pub latency: Duration,
    /// Base URL that transaction references are appended to.
    pub explorer_base: Url,
}

impl ChainConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `KYC_CHAIN_NETWORK` (default: `polygon`)
    /// - `KYC_CHAIN_LATENCY_MS` (default: 1500)
    /// - `KYC_EXPLORER_URL` (default: `https://polygonscan.com/tx/`)
    pub fn from_env() -> Result<Self, ConfigError> {
        let network = std::env::var("KYC_CHAIN_NETWORK").unwrap_or_else(|_| DEFAULT_NETWORK.into());
        if network.trim().is_empty() {
            return Err(ConfigError::Empty("KYC_CHAIN_NETWORK".into()));
        }
        Ok(Self {
            network,
            latency: Duration::from_millis(env_u64("KYC_CHAIN_LATENCY_MS", DEFAULT_LATENCY_MS)?),
            explorer_base: env_url("KYC_EXPLORER_URL", DEFAULT_EXPLORER_URL)?,
        })
    }

    /// The built-in defaults, ignoring the environment.
    pub fn defaults() -> Result<Self, ConfigError> {
        Ok(Self {
            network: DEFAULT_NETWORK.into(),
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            explorer_base: parse_url("default explorer", DEFAULT_EXPLORER_URL)?,
        })
    }

    /// The defaults with zero latency, for tests and offline tooling.
    pub fn instant() -> Result<Self, ConfigError> {
        Ok(Self {
            latency: Duration::ZERO,
            ..Self::defaults()?
        })
    }

    /// Explorer link for a transaction.
    pub fn explorer_url(&self, tx: &TxRef) -> Result<Url, ConfigError> {
        let mut base = self.explorer_base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&tx.to_string())
            .map_err(|e| ConfigError::InvalidUrl("explorer link".into(), e.to_string()))
    }
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            var: var.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn parse_url(what: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(what.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: String, value: String },
    #[error("{0} must not be empty")]
    Empty(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo() {
        let cfg = ChainConfig::defaults().unwrap();
        assert_eq!(cfg.network, "polygon");
        assert_eq!(cfg.latency, Duration::from_millis(1500));
        assert_eq!(cfg.explorer_base.as_str(), "https://polygonscan.com/tx/");
    }

    #[test]
    fn explorer_url_appends_tx() {
        let cfg = ChainConfig::instant().unwrap();
        let tx = TxRef::from_bytes([0xab; 32]);
        let url = cfg.explorer_url(&tx).unwrap();
        assert_eq!(url.as_str(), format!("https://polygonscan.com/tx/{tx}"));
    }

    #[test]
    fn explorer_url_tolerates_missing_trailing_slash() {
        let cfg = ChainConfig {
            explorer_base: Url::parse("https://amoy.polygonscan.com/tx").unwrap(),
            ..ChainConfig::instant().unwrap()
        };
        let tx = TxRef::from_bytes([0x01; 32]);
        assert_eq!(
            cfg.explorer_url(&tx).unwrap().as_str(),
            format!("https://amoy.polygonscan.com/tx/{tx}")
        );
    }

    #[test]
    fn env_u64_uses_default_when_absent() {
        assert_eq!(env_u64("KYC_CHAIN_TEST_ABSENT_9931", 42).unwrap(), 42);
    }

    #[test]
    fn env_u64_rejects_garbage() {
        std::env::set_var("KYC_CHAIN_TEST_BAD_LATENCY", "fast");
        let result = env_u64("KYC_CHAIN_TEST_BAD_LATENCY", 10);
        std::env::remove_var("KYC_CHAIN_TEST_BAD_LATENCY");
        assert!(matches!(result, Err(ConfigError::InvalidNumber { .. })));
    }

    #[test]
    fn env_url_rejects_invalid_url() {
        std::env::set_var("KYC_CHAIN_TEST_BAD_URL", "not a url");
        let result = env_url("KYC_CHAIN_TEST_BAD_URL", DEFAULT_EXPLORER_URL);
        std::env::remove_var("KYC_CHAIN_TEST_BAD_URL");
        assert!(result.is_err());
    }
}
