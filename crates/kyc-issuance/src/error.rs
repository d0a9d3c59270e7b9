//! # Issuance Errors
//!
//! Every lifecycle operation returns [`IssuanceError`]. Callers decide what
//! to do next from two predicates:
//!
//! - [`IssuanceError::is_retryable`]: re-invoking the same operation with
//!   the same input can succeed (chain outages, timeouts, unrecorded
//!   revocations). Digest-based deduplication makes an issue retry
//!   idempotent.
//! - [`IssuanceError::is_fatal`]: the commitment store is corrupt and the
//!   manager will refuse further issuance.

use std::time::Duration;

use thiserror::Error;

use kyc_chain::ChainError;
use kyc_core::{CredentialId, HashError, IssuerId};
use kyc_crypto::CommitmentError;
use kyc_state::{Credential, CredentialError, CredentialStatus, SessionError};

/// Errors from the credential lifecycle manager.
#[derive(Error, Debug)]
pub enum IssuanceError {
    /// The payload is empty, misses a required field, or cannot be hashed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The verification session is not ready to submit.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The issuer is not registered.
    #[error("unknown issuer {0}")]
    UnknownIssuer(IssuerId),

    /// The chain refused or failed the submission. Nothing was created.
    #[error("chain submission failed: {0}")]
    SubmissionFailed(#[source] ChainError),

    /// The chain did not answer in time. Nothing was created.
    #[error("chain submission timed out after {after:?}")]
    SubmissionTimeout {
        /// The configured bound.
        after: Duration,
    },

    /// The credential was revoked locally but the chain did not record the
    /// revocation. Retry with `retry_revocation`.
    #[error("credential {} revoked but revocation not recorded on chain: {reason}", .credential.id)]
    RevocationNotRecorded {
        /// The revoked credential.
        credential: Box<Credential>,
        /// Why the chain call failed.
        reason: String,
    },

    /// No credential with this id.
    #[error("credential {0} not found")]
    NotFound(CredentialId),

    /// The credential is revoked or expired.
    #[error("credential {id} is already {status}")]
    AlreadyTerminal {
        /// The credential.
        id: CredentialId,
        /// Its terminal status.
        status: CredentialStatus,
    },

    /// Revocation retry requested for a credential that is not revoked.
    #[error("credential {id} is {status}, not revoked")]
    NotRevoked {
        /// The credential.
        id: CredentialId,
        /// Its current status.
        status: CredentialStatus,
    },

    /// Verification requested for a credential that is not verified.
    #[error("credential {id} is {status} and cannot be verified")]
    NotVerified {
        /// The credential.
        id: CredentialId,
        /// Its current status.
        status: CredentialStatus,
    },

    /// An illegal lifecycle transition.
    #[error(transparent)]
    Lifecycle(CredentialError),

    /// The commitment store failed an integrity check.
    #[error("commitment store corrupt: {0}")]
    StoreCorrupt(String),

    /// A spawned completion task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IssuanceError {
    /// Whether re-invoking the operation with the same input can succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::SubmissionFailed(e) => e.is_retryable(),
            Self::SubmissionTimeout { .. } | Self::RevocationNotRecorded { .. } => true,
            _ => false,
        }
    }

    /// Whether the manager can no longer issue credentials.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreCorrupt(_))
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::Session(_) => "STEP_INCOMPLETE",
            Self::UnknownIssuer(_) => "UNKNOWN_ISSUER",
            Self::SubmissionFailed(_) => "SUBMISSION_FAILED",
            Self::SubmissionTimeout { .. } => "SUBMISSION_TIMEOUT",
            Self::RevocationNotRecorded { .. } => "REVOCATION_NOT_RECORDED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            Self::NotRevoked { .. } => "NOT_REVOKED",
            Self::NotVerified { .. } => "NOT_VERIFIED",
            Self::Lifecycle(_) => "INVALID_TRANSITION",
            Self::StoreCorrupt(_) => "STORE_CORRUPT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<HashError> for IssuanceError {
    fn from(e: HashError) -> Self {
        Self::InvalidPayload(e.to_string())
    }
}

impl From<CredentialError> for IssuanceError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::AlreadyTerminal { id, status } => Self::AlreadyTerminal { id, status },
            other => Self::Lifecycle(other),
        }
    }
}

impl From<CommitmentError> for IssuanceError {
    fn from(e: CommitmentError) -> Self {
        match e {
            CommitmentError::StoreCorrupt { reason } => Self::StoreCorrupt(reason),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::CredentialType;

    #[test]
    fn retryability() {
        let unavailable = ChainError::Unavailable {
            network: "polygon".into(),
            reason: "rpc down".into(),
        };
        assert!(IssuanceError::SubmissionFailed(unavailable).is_retryable());
        assert!(IssuanceError::SubmissionTimeout {
            after: Duration::from_secs(30)
        }
        .is_retryable());
        assert!(!IssuanceError::NotFound(CredentialId::new()).is_retryable());
        assert!(!IssuanceError::InvalidPayload("empty".into()).is_retryable());
    }

    #[test]
    fn only_store_corruption_is_fatal() {
        assert!(IssuanceError::StoreCorrupt("root mismatch".into()).is_fatal());
        assert!(!IssuanceError::AlreadyTerminal {
            id: CredentialId::new(),
            status: CredentialStatus::Revoked
        }
        .is_fatal());
    }

    #[test]
    fn hash_errors_become_invalid_payload() {
        let err: IssuanceError = HashError::EmptyPayload {
            credential_type: CredentialType::Age,
        }
        .into();
        assert_eq!(err.code(), "INVALID_PAYLOAD");
    }

    #[test]
    fn terminal_credential_error_maps_to_already_terminal() {
        let id = CredentialId::new();
        let err: IssuanceError = CredentialError::AlreadyTerminal {
            id,
            status: CredentialStatus::Expired,
        }
        .into();
        assert!(matches!(err, IssuanceError::AlreadyTerminal { status: CredentialStatus::Expired, .. }));
    }
}
