//! # kyc-issuance: Credential Lifecycle Manager
//!
//! Orchestrates issuance end to end:
//!
//! ```text
//! payload ─▶ digest ─▶ chain submit ─▶ commitment append ─▶ Credential + Issued action
//! ```
//!
//! and governs the rest of a credential's life: revocation (with chain
//! recording and retry), time-based expiry, and relying-party verification.
//!
//! ## Concurrency
//!
//! - Issues are serialized per payload digest, revocations per credential.
//! - Commitment store appends go through one FIFO async mutex.
//! - Chain calls are the only suspension points and are bounded by the
//!   configured submission timeout.
//! - Once the chain has been called, the operation runs to completion on a
//!   spawned task even if the caller stops waiting.

pub mod action;
pub mod config;
pub mod error;
pub mod issuer;
mod keyed_lock;
pub mod manager;
pub mod summary;

pub use action::{Action, ActionKind};
pub use config::{ConfigError, LifecycleConfig};
pub use error::IssuanceError;
pub use issuer::{Issuer, IssuerRegistry};
pub use manager::CredentialLifecycleManager;
pub use summary::{KycStatus, KycSummary};
