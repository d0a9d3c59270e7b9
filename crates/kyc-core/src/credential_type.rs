//! # Credential Types
//!
//! The three verification flows the product supports, with the payload
//! fields each one must carry before it can be hashed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The kind of verification a credential attests to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CredentialType {
    /// Government identity document plus selfie match.
    Identity,
    /// Liveness check proving the holder is a human.
    Human,
    /// Proof that the holder meets an age threshold.
    Age,
}

impl CredentialType {
    /// All credential types, in dashboard display order.
    pub const ALL: [CredentialType; 3] = [Self::Identity, Self::Human, Self::Age];

    /// Payload fields the hasher requires for this type.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Identity => &["fullName", "country", "docType"],
            Self::Human => &["livenessCheck"],
            Self::Age => &["ageRange", "method"],
        }
    }

    /// Canonical name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::Human => "Human",
            Self::Age => "Age",
        }
    }
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialType {
    type Err = ValidationError;

    /// Case-insensitive parse, so query strings like `?type=identity` work.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" => Ok(Self::Identity),
            "human" => Ok(Self::Human),
            "age" => Ok(Self::Age),
            _ => Err(ValidationError::UnknownCredentialType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("identity".parse::<CredentialType>().unwrap(), CredentialType::Identity);
        assert_eq!("HUMAN".parse::<CredentialType>().unwrap(), CredentialType::Human);
        assert_eq!(" Age ".parse::<CredentialType>().unwrap(), CredentialType::Age);
        assert!("passport".parse::<CredentialType>().is_err());
    }

    #[test]
    fn display_matches_serde() {
        for ty in CredentialType::ALL {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{ty}\""));
        }
    }

    #[test]
    fn every_type_requires_at_least_one_field() {
        for ty in CredentialType::ALL {
            assert!(!ty.required_fields().is_empty());
        }
    }
}
