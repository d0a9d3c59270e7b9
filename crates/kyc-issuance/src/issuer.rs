//! Registry of credential issuers.
//!
//! Seeded with the three issuing authorities of the hosted dashboard. Each
//! credential type has a default issuer used when a request names none.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use kyc_core::{CredentialType, IssuerId, ValidationError, WalletAddress};

/// A credential issuing authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Stable identifier.
    pub id: IssuerId,
    /// Display name.
    pub name: String,
    /// Signing wallet of the issuer.
    pub address: WalletAddress,
}

/// The known issuers and the default issuer per credential type.
#[derive(Debug, Clone)]
pub struct IssuerRegistry {
    issuers: Vec<Issuer>,
    defaults: BTreeMap<CredentialType, IssuerId>,
}

const KYC_PLATFORM: u128 = 0x6b79_6300_0000_4000_8000_0000_0000_0001;
const IDENTITY_VERIFIER: u128 = 0x6b79_6300_0000_4000_8000_0000_0000_0002;
const AGE_VERIFICATION_SERVICE: u128 = 0x6b79_6300_0000_4000_8000_0000_0000_0003;

impl IssuerRegistry {
    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            issuers: Vec::new(),
            defaults: BTreeMap::new(),
        }
    }

    /// The three built-in issuers, each the default for one credential type.
    pub fn builtin() -> Result<Self, ValidationError> {
        let mut registry = Self::empty();
        let seed = [
            (
                KYC_PLATFORM,
                "KYC Platform",
                "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0",
                CredentialType::Identity,
            ),
            (
                IDENTITY_VERIFIER,
                "Identity Verifier",
                "0x8ba1f109551bD432803012645Ac136ddd64DBA72",
                CredentialType::Human,
            ),
            (
                AGE_VERIFICATION_SERVICE,
                "Age Verification Service",
                "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
                CredentialType::Age,
            ),
        ];
        for (id, name, address, ty) in seed {
            let issuer = Issuer {
                id: IssuerId::from_uuid(Uuid::from_u128(id)),
                name: name.to_string(),
                address: WalletAddress::new(address)?,
            };
            registry.register(issuer.clone());
            registry.set_default(ty, issuer.id);
        }
        Ok(registry)
    }

    /// Add an issuer, replacing any issuer with the same id.
    pub fn register(&mut self, issuer: Issuer) {
        self.issuers.retain(|i| i.id != issuer.id);
        self.issuers.push(issuer);
    }

    /// Make `issuer` the default for `ty`. Returns false if unknown.
    pub fn set_default(&mut self, ty: CredentialType, issuer: IssuerId) -> bool {
        if self.get(issuer).is_none() {
            return false;
        }
        self.defaults.insert(ty, issuer);
        true
    }

    /// Look up an issuer.
    pub fn get(&self, id: IssuerId) -> Option<&Issuer> {
        self.issuers.iter().find(|i| i.id == id)
    }

    /// The default issuer for a credential type.
    pub fn default_for(&self, ty: CredentialType) -> Option<&Issuer> {
        self.defaults.get(&ty).and_then(|id| self.get(*id))
    }

    /// All issuers in registration order.
    pub fn all(&self) -> &[Issuer] {
        &self.issuers
    }
}
