//! # kyc-chain: Chain Submission
//!
//! The chain is an external collaborator. The pipeline only depends on the
//! object-safe [`ChainSubmitter`] trait:
//!
//! - `submit(commitment)` anchors a credential digest and returns a [`TxRef`].
//! - `submit_revocation(credential_id, reason)` records a revocation.
//!
//! Both calls are fallible and latency-bearing. [`SimulatedChain`] stands in
//! for a real network: configurable latency, deterministic transaction
//! references, and a script of forced outcomes for tests.
//!
//! [`TxRef`]: kyc_core::TxRef

pub mod config;
pub mod error;
pub mod simulated;
pub mod submitter;

pub use config::{ChainConfig, ConfigError};
pub use error::ChainError;
pub use simulated::{ScriptedOutcome, SimulatedChain};
pub use submitter::{ChainSubmitter, Commitment};
