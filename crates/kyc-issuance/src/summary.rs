//! Per-holder verification status overview.

use serde::{Serialize, Serializer};

use kyc_state::CredentialStatus;

/// Status of one credential type for a holder: the status of the most
/// recently issued credential of that type, or `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KycStatus {
    /// No credential of this type was ever issued to the holder.
    None,
    /// Status of the latest credential.
    Credential(CredentialStatus),
}

impl KycStatus {
    /// Display name; `None` when no credential exists.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Credential(status) => status.as_str(),
        }
    }
}

impl Serialize for KycStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<Option<CredentialStatus>> for KycStatus {
    fn from(status: Option<CredentialStatus>) -> Self {
        status.map_or(Self::None, Self::Credential)
    }
}

/// A holder's status across all three flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KycSummary {
    /// Identity flow.
    pub identity: KycStatus,
    /// Human flow.
    pub human: KycStatus,
    /// Age flow.
    pub age: KycStatus,
}

impl Default for KycSummary {
    fn default() -> Self {
        Self {
            identity: KycStatus::None,
            human: KycStatus::None,
            age: KycStatus::None,
        }
    }
}
