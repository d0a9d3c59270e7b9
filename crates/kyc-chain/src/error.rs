//! Errors returned by chain submitters.

use thiserror::Error;

/// A chain call did not produce a confirmation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The network rejected the transaction.
    #[error("chain {network} rejected transaction: {reason}")]
    Rejected {
        /// Network name.
        network: String,
        /// Rejection reason reported by the network.
        reason: String,
    },

    /// The network could not be reached.
    #[error("chain {network} unavailable: {reason}")]
    Unavailable {
        /// Network name.
        network: String,
        /// Transport failure description.
        reason: String,
    },

    /// The submission could not be encoded.
    #[error("commitment encoding failed: {0}")]
    Encoding(String),
}

impl ChainError {
    /// Whether retrying the identical submission can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Rejected { .. })
    }
}
