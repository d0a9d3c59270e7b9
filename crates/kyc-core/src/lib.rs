//! # kyc-core: Foundational Types for the KYC Credential Pipeline
//!
//! This crate is the leaf of the workspace DAG. It defines the primitives
//! every other crate builds on:
//!
//! 1. **`CanonicalBytes`.** All digest computation flows through
//!    `CanonicalBytes::new()` (RFC 8785 JCS). No raw `serde_json::to_vec()`
//!    for digests.
//!
//! 2. **The payload hasher.** [`hasher::digest()`] turns a
//!    [`CredentialPayload`] into a 32-byte [`ContentDigest`], rejecting
//!    payloads that miss a field required by their [`CredentialType`].
//!
//! 3. **Newtypes for identifiers.** [`CredentialId`], [`ActionId`],
//!    [`IssuerId`], [`WalletAddress`] and [`TxRef`]. No bare strings for
//!    identifiers.
//!
//! 4. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kyc-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod credential_type;
pub mod digest;
pub mod error;
pub mod hasher;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use credential_type::CredentialType;
pub use digest::{sha256_digest, sha256_hex, sha256_raw, ContentDigest};
pub use error::{CanonicalizationError, HashError, ValidationError};
pub use hasher::{digest, CredentialPayload, FieldMap};
pub use identity::{ActionId, CredentialId, IssuerId, TxRef, WalletAddress};
pub use temporal::Timestamp;
