//! # Simulated Chain
//!
//! An in-process [`ChainSubmitter`] that behaves like a slow network:
//!
//! - every call sleeps for the configured latency before answering,
//! - transaction references are `SHA256(network || nonce_be64 || JCS(payload))`,
//!   so the same sequence of calls always yields the same references,
//! - tests can queue forced outcomes (rejection, outage, hang) per call kind.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use kyc_core::{sha256_raw, CanonicalBytes, CredentialId, TxRef};

use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::submitter::{ChainSubmitter, Commitment};

/// A forced outcome for the next call of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedOutcome {
    /// Confirm normally.
    Confirm,
    /// Answer with [`ChainError::Rejected`].
    Reject(String),
    /// Answer with [`ChainError::Unavailable`].
    Unavailable(String),
    /// Never answer.
    Hang,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RevocationRecord<'a> {
    credential_id: CredentialId,
    reason: &'a str,
}

/// In-process chain with configurable latency and scripted failures.
#[derive(Debug)]
pub struct SimulatedChain {
    network: String,
    latency: Duration,
    nonce: AtomicU64,
    submit_script: Mutex<VecDeque<ScriptedOutcome>>,
    revocation_script: Mutex<VecDeque<ScriptedOutcome>>,
    submit_calls: AtomicU64,
    revocation_calls: AtomicU64,
    confirmed: Mutex<Vec<(TxRef, Commitment)>>,
}

impl SimulatedChain {
    /// Create a simulated chain from configuration.
    pub fn new(config: &ChainConfig) -> Self {
        Self::with_latency(config.network.clone(), config.latency)
    }

    /// Create a simulated chain with an explicit network name and latency.
    pub fn with_latency(network: impl Into<String>, latency: Duration) -> Self {
        Self {
            network: network.into(),
            latency,
            nonce: AtomicU64::new(0),
            submit_script: Mutex::new(VecDeque::new()),
            revocation_script: Mutex::new(VecDeque::new()),
            submit_calls: AtomicU64::new(0),
            revocation_calls: AtomicU64::new(0),
            confirmed: Mutex::new(Vec::new()),
        }
    }

    /// Zero-latency chain named `test`.
    pub fn instant() -> Self {
        Self::with_latency("test", Duration::ZERO)
    }

    /// Queue an outcome for the next `submit` call.
    pub fn script_submit(&self, outcome: ScriptedOutcome) {
        self.submit_script.lock().push_back(outcome);
    }

    /// Queue an outcome for the next `submit_revocation` call.
    pub fn script_revocation(&self, outcome: ScriptedOutcome) {
        self.revocation_script.lock().push_back(outcome);
    }

    /// Number of `submit` calls received.
    pub fn submit_calls(&self) -> u64 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Number of `submit_revocation` calls received.
    pub fn revocation_calls(&self) -> u64 {
        self.revocation_calls.load(Ordering::SeqCst)
    }

    /// Commitments confirmed so far, in confirmation order.
    pub fn confirmed(&self) -> Vec<(TxRef, Commitment)> {
        self.confirmed.lock().clone()
    }

    async fn settle(&self, outcome: ScriptedOutcome) -> Result<(), ChainError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match outcome {
            ScriptedOutcome::Confirm => Ok(()),
            ScriptedOutcome::Reject(reason) => Err(ChainError::Rejected {
                network: self.network.clone(),
                reason,
            }),
            ScriptedOutcome::Unavailable(reason) => Err(ChainError::Unavailable {
                network: self.network.clone(),
                reason,
            }),
            ScriptedOutcome::Hang => std::future::pending().await,
        }
    }

    fn tx_ref(&self, payload: &impl Serialize) -> Result<TxRef, ChainError> {
        let canonical =
            CanonicalBytes::new(payload).map_err(|e| ChainError::Encoding(e.to_string()))?;
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let mut input = Vec::with_capacity(self.network.len() + 8 + canonical.len());
        input.extend_from_slice(self.network.as_bytes());
        input.extend_from_slice(&nonce.to_be_bytes());
        input.extend_from_slice(canonical.as_bytes());
        Ok(TxRef::from_bytes(sha256_raw(&input)))
    }
}

#[async_trait]
impl ChainSubmitter for SimulatedChain {
    async fn submit(&self, commitment: &Commitment) -> Result<TxRef, ChainError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .submit_script
            .lock()
            .pop_front()
            .unwrap_or(ScriptedOutcome::Confirm);
        tracing::debug!(network = %self.network, digest = %commitment.digest, ?outcome, "submitting commitment");

        self.settle(outcome).await?;
        let tx = self.tx_ref(commitment)?;
        self.confirmed.lock().push((tx, commitment.clone()));
        tracing::debug!(network = %self.network, %tx, "commitment confirmed");
        Ok(tx)
    }

    async fn submit_revocation(
        &self,
        credential_id: CredentialId,
        reason: &str,
    ) -> Result<TxRef, ChainError> {
        self.revocation_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .revocation_script
            .lock()
            .pop_front()
            .unwrap_or(ScriptedOutcome::Confirm);
        tracing::debug!(network = %self.network, %credential_id, ?outcome, "submitting revocation");

        self.settle(outcome).await?;
        let tx = self.tx_ref(&RevocationRecord {
            credential_id,
            reason,
        })?;
        tracing::debug!(network = %self.network, %tx, "revocation confirmed");
        Ok(tx)
    }

    fn network(&self) -> &str {
        &self.network
    }
}
