//! # kyc-state: Credential and Session State Machines
//!
//! - [`credential`]: the issued-credential record and its lifecycle
//!   `Pending → Verified → {Expired, Revoked}`, with `Pending → Revoked`
//!   also legal. `Revoked` and `Expired` are terminal.
//! - [`session`]: the per-flow verification sessions that collect user
//!   input step by step and yield an [`IssuanceRequest`].
//!
//! Neither module performs I/O. Orchestration (hashing, chain submission,
//! commitment) lives in `kyc-issuance`.

pub mod credential;
pub mod session;

pub use credential::{Credential, CredentialError, CredentialStatus, NewCredential};
pub use session::{
    AgeRange, AgeSession, AgeStep, DocType, HumanSession, HumanStep, IdentitySession,
    IdentityStep, IssuanceRequest, SessionError, UploadedFile, VerificationMethod,
    VerificationSession,
};
