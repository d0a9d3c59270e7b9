//! # Error Types
//!
//! Leaf-level errors for the pipeline. All errors use `thiserror`.
//!
//! - Canonicalization errors carry the offending value.
//! - Validation errors name the field or value that failed and why.
//! - Hash errors distinguish a missing required field from a payload the
//!   canonicalizer refused.

use thiserror::Error;

use crate::credential_type::CredentialType;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A domain primitive failed validation at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Wallet address is not `0x` followed by 40 hex digits.
    #[error("invalid wallet address {value:?}: {reason}")]
    InvalidWalletAddress {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A hex-encoded value could not be decoded.
    #[error("invalid hex {value:?}: {reason}")]
    InvalidHex {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An unknown credential type name.
    #[error("unknown credential type {0:?}")]
    UnknownCredentialType(String),

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Hashing a credential payload failed.
///
/// Every variant is an `InvalidPayload` condition: the caller must fix the
/// input, retrying the same payload cannot succeed.
#[derive(Error, Debug)]
pub enum HashError {
    /// The payload carries no fields at all.
    #[error("payload for {credential_type} credential has no fields")]
    EmptyPayload {
        /// Credential type of the rejected payload.
        credential_type: CredentialType,
    },

    /// A field required by the credential type is absent, null or empty.
    #[error("payload for {credential_type} credential is missing required field {field:?}")]
    MissingField {
        /// Credential type of the rejected payload.
        credential_type: CredentialType,
        /// The required field.
        field: &'static str,
    },

    /// The payload could not be canonicalized.
    #[error("payload could not be canonicalized: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}
