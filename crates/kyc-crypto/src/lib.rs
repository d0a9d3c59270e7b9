//! # kyc-crypto: Commitment Store for Issued Credentials
//!
//! Every credential the pipeline issues is committed to an append-only
//! binary Merkle tree. This crate provides:
//!
//! - **Domain-separated hashing** ([`leaf_hash`], [`node_hash`]) so a leaf
//!   can never be confused with an interior node.
//! - **Inclusion proofs** ([`InclusionProof`]) that a relying party can
//!   check offline with [`verify`].
//! - **[`CommitmentStore`]**, the stateful accumulator that appends digests,
//!   records the proof issued at insertion, and regenerates proofs against
//!   later roots.

pub mod error;
pub mod merkle;
pub mod store;

pub use error::CommitmentError;
pub use merkle::{leaf_hash, node_hash, verify, InclusionProof, MerkleHash, PathStep, Side};
pub use store::{AppendReceipt, CommitmentEntry, CommitmentStore};
