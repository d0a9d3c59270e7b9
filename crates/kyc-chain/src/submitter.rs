//! The chain submission trait and the commitment it anchors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use kyc_core::{ContentDigest, CredentialId, CredentialType, IssuerId, TxRef, WalletAddress};

use crate::error::ChainError;

/// What gets anchored on chain when a credential is issued.
///
/// Only the digest and routing data leave the process; payload fields never
/// do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitment {
    /// Content digest of the verified payload.
    pub digest: ContentDigest,
    /// Verification flow.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// Bound wallet.
    pub holder: WalletAddress,
    /// Issuing authority.
    pub issuer: IssuerId,
}

/// Anchors commitments and revocations on a chain.
///
/// Implementations must be safe to call concurrently. Callers bound every
/// call with their own timeout.
#[async_trait]
pub trait ChainSubmitter: Send + Sync {
    /// Anchor a credential commitment, returning its confirmation reference.
    async fn submit(&self, commitment: &Commitment) -> Result<TxRef, ChainError>;

    /// Record a revocation, returning its confirmation reference.
    async fn submit_revocation(
        &self,
        credential_id: CredentialId,
        reason: &str,
    ) -> Result<TxRef, ChainError>;

    /// Name of the network the submitter talks to.
    fn network(&self) -> &str;
}
