//! Append-only audit records of credential state changes.

use serde::{Deserialize, Serialize};

use kyc_core::{ActionId, CredentialId, CredentialType, Timestamp, TxRef};

/// What happened to a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// The credential was issued.
    Issued,
    /// The credential was revoked.
    Revoked,
    /// A relying party checked the credential.
    Verified,
}

impl ActionKind {
    /// Canonical name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issued => "Issued",
            Self::Revoked => "Revoked",
            Self::Verified => "Verified",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit entry. The log's insertion order is the causal order of
/// credential state changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Unique identifier.
    pub id: ActionId,
    /// The credential acted upon.
    pub credential_id: CredentialId,
    /// Its verification flow.
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    /// What happened.
    pub kind: ActionKind,
    /// When it happened.
    pub timestamp: Timestamp,
    /// Chain confirmation, when the change was anchored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_ref: Option<TxRef>,
}

impl Action {
    /// Record an action now.
    pub fn now(
        credential_id: CredentialId,
        credential_type: CredentialType,
        kind: ActionKind,
        tx_ref: Option<TxRef>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            credential_id,
            credential_type,
            kind,
            timestamp: Timestamp::now(),
            tx_ref,
        }
    }
}
