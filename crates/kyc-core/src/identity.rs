//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers. Each identifier is a distinct
//! type: you cannot pass an [`ActionId`] where a [`CredentialId`] is
//! expected.
//!
//! ## Validation
//!
//! String-based identifiers ([`WalletAddress`], [`TxRef`]) validate format at
//! construction and at deserialization. UUID-based identifiers are always
//! valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::digest::{decode_hex_32, encode_hex};
use crate::error::ValidationError;

/// Deserialize a string newtype through its validating `new()` constructor
/// so that invalid values are rejected instead of silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Define a UUID-backed identifier newtype.
macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $ty:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $ty(Uuid);

        impl $ty {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $ty {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// UUID-based identifiers
// ---------------------------------------------------------------------------

uuid_identifier!(
    /// Identifier of an issued credential.
    CredentialId
);

uuid_identifier!(
    /// Identifier of an audit action.
    ActionId
);

uuid_identifier!(
    /// Identifier of a registered credential issuer.
    IssuerId
);

// ---------------------------------------------------------------------------
// Wallet address
// ---------------------------------------------------------------------------

/// An EVM-style wallet address: `0x` followed by 40 hex digits.
///
/// Stored lowercase, so checksummed and plain spellings of the same
/// address compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Validate and normalize a wallet address.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let raw: String = s.into();
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix("0x").ok_or_else(|| {
            ValidationError::InvalidWalletAddress {
                value: raw.clone(),
                reason: "must start with 0x".into(),
            }
        })?;
        if body.len() != 40 {
            return Err(ValidationError::InvalidWalletAddress {
                value: raw.clone(),
                reason: format!("expected 40 hex digits, got {}", body.len()),
            });
        }
        if !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidWalletAddress {
                value: raw.clone(),
                reason: "contains non-hex characters".into(),
            });
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }

    /// The normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display, e.g. `0x742d...0beb`.
    pub fn shortened(&self, chars: usize) -> String {
        let chars = chars.min(20);
        let tail_start = self.0.len() - chars;
        format!("{}...{}", &self.0[..chars + 2], &self.0[tail_start..])
    }
}

impl_validating_deserialize!(WalletAddress);

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Transaction reference
// ---------------------------------------------------------------------------

/// A chain confirmation reference: `0x` followed by 64 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct TxRef([u8; 32]);

impl TxRef {
    /// Parse a transaction reference from its hex form.
    pub fn new(s: impl Into<String>) -> Result<Self, ValidationError> {
        let raw: String = s.into();
        decode_hex_32(&raw).map(Self)
    }

    /// Wrap raw transaction hash bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw transaction hash bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl_validating_deserialize!(TxRef);

impl From<TxRef> for String {
    fn from(tx: TxRef) -> Self {
        tx.to_string()
    }
}

impl std::fmt::Display for TxRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", encode_hex(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0";

    #[test]
    fn wallet_address_normalizes_case() {
        let a = WalletAddress::new(ADDR).unwrap();
        let b = WalletAddress::new(ADDR.to_lowercase()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), ADDR.to_lowercase());
    }

    #[test]
    fn wallet_address_rejects_bad_shapes() {
        assert!(WalletAddress::new("742d35Cc6634C0532925a3b844Bc9e7595f0bEb0").is_err());
        assert!(WalletAddress::new("0x742d").is_err());
        assert!(WalletAddress::new("0xZZ2d35Cc6634C0532925a3b844Bc9e7595f0bEb0").is_err());
    }

    #[test]
    fn wallet_address_deserialize_validates() {
        let ok: Result<WalletAddress, _> = serde_json::from_str(&format!("\"{ADDR}\""));
        assert!(ok.is_ok());
        let bad: Result<WalletAddress, _> = serde_json::from_str("\"0x1234\"");
        assert!(bad.is_err());
    }

    #[test]
    fn wallet_address_shortened() {
        let a = WalletAddress::new(ADDR).unwrap();
        assert_eq!(a.shortened(4), "0x742d...beb0");
    }

    #[test]
    fn tx_ref_display_and_parse() {
        let tx = TxRef::from_bytes([0xcd; 32]);
        let s = tx.to_string();
        assert_eq!(s.len(), 66);
        assert_eq!(TxRef::new(s.clone()).unwrap(), tx);
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, format!("\"{s}\""));
        let back: TxRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tx);
    }

    #[test]
    fn uuid_identifiers_serialize_transparently() {
        let id = CredentialId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let back: CredentialId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn distinct_ids_are_unique() {
        assert_ne!(ActionId::new(), ActionId::new());
    }
}
