//! Structured errors for commitment store operations.

use kyc_core::ContentDigest;
use thiserror::Error;

/// Errors from the commitment store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitmentError {
    /// Path recomputation disagreed with the stored tree. The store refuses
    /// all further writes once this has been observed.
    #[error("commitment store corrupt: {reason}")]
    StoreCorrupt {
        /// What failed to match.
        reason: String,
    },

    /// No leaf exists at the requested index.
    #[error("leaf index {leaf_index} out of range (store holds {size} leaves)")]
    LeafOutOfRange {
        /// The requested index.
        leaf_index: u64,
        /// Number of leaves in the store.
        size: u64,
    },

    /// The digest is already committed.
    #[error("digest {digest} already committed at leaf {leaf_index}")]
    DuplicateDigest {
        /// The rejected digest.
        digest: ContentDigest,
        /// Where it was first committed.
        leaf_index: u64,
    },
}

impl CommitmentError {
    /// Whether the store can no longer accept writes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreCorrupt { .. })
    }
}
