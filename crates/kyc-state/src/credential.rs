//! # Credential Lifecycle
//!
//! An issued credential moves through:
//!
//! ```text
//! Pending ──confirm──▶ Verified ──expire──▶ Expired
//!    │                    │
//!    └──────revoke────────┴──────revoke───▶ Revoked
//! ```
//!
//! `Revoked` and `Expired` are terminal. Every transition is a method on
//! [`Credential`] that checks the current status and returns a
//! [`CredentialError`] instead of mutating when the move is illegal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kyc_core::{
    ContentDigest, CredentialId, CredentialType, FieldMap, IssuerId, Timestamp, TxRef,
    WalletAddress,
};
use kyc_crypto::MerkleHash;

/// The lifecycle status of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialStatus {
    /// Confirmed on chain but not yet committed.
    Pending,
    /// Committed and valid.
    Verified,
    /// Validity window elapsed. Terminal state.
    Expired,
    /// Explicitly revoked. Terminal state.
    Revoked,
}

impl CredentialStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Revoked)
    }

    /// Canonical name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::Expired => "Expired",
            Self::Revoked => "Revoked",
        }
    }
}

impl std::fmt::Display for CredentialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from credential state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The credential is revoked or expired.
    #[error("credential {id} is already {status}")]
    AlreadyTerminal {
        /// The credential.
        id: CredentialId,
        /// Its terminal status.
        status: CredentialStatus,
    },

    /// The transition is not permitted from the current status.
    #[error("credential {id}: cannot move from {from} to {to}: {reason}")]
    InvalidTransition {
        /// The credential.
        id: CredentialId,
        /// Current status.
        from: CredentialStatus,
        /// Attempted target status.
        to: CredentialStatus,
        /// Why it was rejected.
        reason: String,
    },

    /// Expiry would not be after issuance.
    #[error("expiry {expiry} must be after issuance {issued}")]
    InvalidValidityWindow {
        /// Issue time.
        issued: Timestamp,
        /// Rejected expiry time.
        expiry: Timestamp,
    },
}

/// Everything needed to create a credential record.
#[derive(Debug, Clone)]
pub struct NewCredential {
    /// Verification flow.
    pub credential_type: CredentialType,
    /// Bound wallet.
    pub holder: WalletAddress,
    /// Issuing authority.
    pub issuer: IssuerId,
    /// Issue time.
    pub issue_time: Timestamp,
    /// Expiry time; must be after `issue_time`.
    pub expiry_time: Timestamp,
    /// Chain confirmation of the commitment.
    pub tx_ref: TxRef,
    /// Content digest of the payload.
    pub digest: ContentDigest,
    /// Commitment tree leaf.
    pub merkle_leaf: MerkleHash,
    /// Commitment tree position.
    pub leaf_index: u64,
    /// Commitment tree root right after the leaf was appended.
    pub root_at_issuance: MerkleHash,
    /// Human-readable proof description.
    pub proof_summary: Option<String>,
    /// Display metadata.
    pub metadata: FieldMap,
}

/// An issued credential.
///
/// `digest` and `merkle_leaf` are derived by the pipeline, never supplied
/// by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Unique identifier.
    pub id: CredentialId,
    /// Verification flow.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// Bound wallet.
    pub holder: WalletAddress,
    /// Issuing authority.
    pub issuer: IssuerId,
    /// Current lifecycle status.
    pub status: CredentialStatus,
    /// Issue time.
    pub issue_time: Timestamp,
    /// Expiry time.
    pub expiry_time: Timestamp,
    /// Chain confirmation of the commitment.
    pub tx_ref: TxRef,
    /// Content digest of the payload.
    pub digest: ContentDigest,
    /// Commitment tree leaf.
    pub merkle_leaf: MerkleHash,
    /// Commitment tree position.
    pub leaf_index: u64,
    /// Commitment tree root right after the leaf was appended.
    pub root_at_issuance: MerkleHash,
    /// Human-readable proof description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_summary: Option<String>,
    /// Display metadata.
    pub metadata: FieldMap,
    /// Why the credential was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
    /// When the credential was revoked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<Timestamp>,
    /// Chain confirmation of the revocation, once recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_tx_ref: Option<TxRef>,
}

impl Credential {
    /// Create a `Pending` credential.
    pub fn pending(new: NewCredential) -> Result<Self, CredentialError> {
        Self::check_validity_window(new.issue_time, new.expiry_time)?;
        Ok(Self {
            id: CredentialId::new(),
            credential_type: new.credential_type,
            holder: new.holder,
            issuer: new.issuer,
            status: CredentialStatus::Pending,
            issue_time: new.issue_time,
            expiry_time: new.expiry_time,
            tx_ref: new.tx_ref,
            digest: new.digest,
            merkle_leaf: new.merkle_leaf,
            leaf_index: new.leaf_index,
            root_at_issuance: new.root_at_issuance,
            proof_summary: new.proof_summary,
            metadata: new.metadata,
            revocation_reason: None,
            revoked_at: None,
            revocation_tx_ref: None,
        })
    }

    /// Expiry must fall strictly after issue.
    pub fn check_validity_window(
        issue_time: Timestamp,
        expiry_time: Timestamp,
    ) -> Result<(), CredentialError> {
        if expiry_time <= issue_time {
            return Err(CredentialError::InvalidValidityWindow {
                issued: issue_time,
                expiry: expiry_time,
            });
        }
        Ok(())
    }

    /// `Pending → Verified`.
    pub fn confirm(&mut self) -> Result<(), CredentialError> {
        self.ensure_not_terminal()?;
        if self.status != CredentialStatus::Pending {
            return Err(CredentialError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: CredentialStatus::Verified,
                reason: "only pending credentials can be confirmed".into(),
            });
        }
        self.status = CredentialStatus::Verified;
        Ok(())
    }

    /// `Pending | Verified → Revoked`, recording the reason.
    pub fn revoke(&mut self, reason: impl Into<String>, at: Timestamp) -> Result<(), CredentialError> {
        self.ensure_not_terminal()?;
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(CredentialError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: CredentialStatus::Revoked,
                reason: "revocation reason must not be empty".into(),
            });
        }
        self.status = CredentialStatus::Revoked;
        self.revocation_reason = Some(reason);
        self.revoked_at = Some(at);
        Ok(())
    }

    /// `Verified → Expired` if `expiry_time <= now`.
    ///
    /// Returns whether the credential expired. Pending and terminal
    /// credentials are left untouched.
    pub fn expire_if_due(&mut self, now: Timestamp) -> bool {
        if self.status == CredentialStatus::Verified && self.expiry_time <= now {
            self.status = CredentialStatus::Expired;
            true
        } else {
            false
        }
    }

    /// Record the chain confirmation of an earlier revocation.
    pub fn record_revocation_tx(&mut self, tx_ref: TxRef) -> Result<(), CredentialError> {
        if self.status != CredentialStatus::Revoked {
            return Err(CredentialError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: CredentialStatus::Revoked,
                reason: "only revoked credentials carry a revocation transaction".into(),
            });
        }
        self.revocation_tx_ref = Some(tx_ref);
        Ok(())
    }

    /// Whether the credential is revoked but the revocation is not yet
    /// confirmed on chain.
    pub fn revocation_pending(&self) -> bool {
        self.status == CredentialStatus::Revoked && self.revocation_tx_ref.is_none()
    }

    fn ensure_not_terminal(&self) -> Result<(), CredentialError> {
        if self.status.is_terminal() {
            return Err(CredentialError::AlreadyTerminal {
                id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_credential() -> NewCredential {
        let issued = Timestamp::parse("2024-01-15T10:30:00Z").unwrap();
        NewCredential {
            credential_type: CredentialType::Identity,
            holder: WalletAddress::new("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap(),
            issuer: IssuerId::new(),
            issue_time: issued,
            expiry_time: issued.plus_days(365).unwrap(),
            tx_ref: TxRef::from_bytes([0x11; 32]),
            digest: ContentDigest::from_bytes([0x22; 32]),
            merkle_leaf: MerkleHash::from_bytes([0x33; 32]),
            leaf_index: 0,
            root_at_issuance: MerkleHash::from_bytes([0x33; 32]),
            proof_summary: None,
            metadata: FieldMap::new(),
        }
    }

    fn verified() -> Credential {
        let mut c = Credential::pending(new_credential()).unwrap();
        c.confirm().unwrap();
        c
    }

    #[test]
    fn pending_then_confirmed() {
        let mut c = Credential::pending(new_credential()).unwrap();
        assert_eq!(c.status, CredentialStatus::Pending);
        c.confirm().unwrap();
        assert_eq!(c.status, CredentialStatus::Verified);
        assert!(matches!(c.confirm(), Err(CredentialError::InvalidTransition { .. })));
    }

    #[test]
    fn expiry_must_follow_issuance() {
        let mut n = new_credential();
        n.expiry_time = n.issue_time;
        assert!(matches!(
            Credential::pending(n),
            Err(CredentialError::InvalidValidityWindow { .. })
        ));
    }

    #[test]
    fn revoke_from_verified_and_pending() {
        let at = Timestamp::parse("2024-03-01T00:00:00Z").unwrap();
        let mut v = verified();
        v.revoke("fraud detected", at).unwrap();
        assert_eq!(v.status, CredentialStatus::Revoked);
        assert_eq!(v.revocation_reason.as_deref(), Some("fraud detected"));
        assert_eq!(v.revoked_at, Some(at));
        assert!(v.revocation_pending());

        let mut p = Credential::pending(new_credential()).unwrap();
        p.revoke("withdrawn", at).unwrap();
        assert_eq!(p.status, CredentialStatus::Revoked);
    }

    #[test]
    fn revoke_requires_reason() {
        let mut v = verified();
        assert!(v.revoke("  ", Timestamp::now()).is_err());
        assert_eq!(v.status, CredentialStatus::Verified);
        assert!(v.revocation_reason.is_none());
    }

    #[test]
    fn terminal_states_reject_transitions() {
        let mut c = verified();
        assert!(c.expire_if_due(c.expiry_time));
        assert_eq!(c.status, CredentialStatus::Expired);
        let err = c.revoke("late", Timestamp::now()).unwrap_err();
        assert_eq!(
            err,
            CredentialError::AlreadyTerminal {
                id: c.id,
                status: CredentialStatus::Expired
            }
        );
        assert_eq!(c.status, CredentialStatus::Expired);
        assert!(c.revocation_reason.is_none());
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let mut c = verified();
        let just_before = Timestamp::parse("2025-01-14T10:29:59Z").unwrap();
        assert_eq!(c.expiry_time.to_iso8601(), "2025-01-14T10:30:00Z");
        assert!(!c.expire_if_due(just_before));
        assert_eq!(c.status, CredentialStatus::Verified);
        assert!(c.expire_if_due(c.expiry_time));
    }

    #[test]
    fn pending_and_revoked_never_expire() {
        let far_future = Timestamp::parse("2099-01-01T00:00:00Z").unwrap();
        let mut p = Credential::pending(new_credential()).unwrap();
        assert!(!p.expire_if_due(far_future));
        assert_eq!(p.status, CredentialStatus::Pending);

        let mut r = verified();
        r.revoke("compromised", Timestamp::now()).unwrap();
        assert!(!r.expire_if_due(far_future));
        assert_eq!(r.status, CredentialStatus::Revoked);
    }

    #[test]
    fn revocation_tx_only_on_revoked() {
        let mut c = verified();
        assert!(c.record_revocation_tx(TxRef::from_bytes([1; 32])).is_err());
        c.revoke("fraud", Timestamp::now()).unwrap();
        c.record_revocation_tx(TxRef::from_bytes([1; 32])).unwrap();
        assert!(!c.revocation_pending());
    }

    #[test]
    fn serializes_camel_case_with_type_tag() {
        let c = verified();
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["type"], "Identity");
        assert_eq!(v["status"], "Verified");
        assert!(v.get("merkleLeaf").is_some());
        assert!(v.get("revocationReason").is_none());
    }
}
