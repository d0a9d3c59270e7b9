//! # Credential Lifecycle Manager
//!
//! Owns the credential ledger, the action log and the commitment store, and
//! drives every state change through them.
//!
//! ## Issuance
//!
//! 1. Validate and digest the payload.
//! 2. Take the per-digest lock. A payload already issued returns the
//!    existing credential instead of a second one.
//! 3. Submit the commitment to the chain, bounded by the submission timeout.
//! 4. Append the digest to the commitment store, build the credential
//!    (`Pending`, then `Verified`), and record an `Issued` action.
//!
//! Steps 3 and 4 run on a spawned task that owns the digest lock, so a
//! caller that stops waiting never leaves a confirmed commitment without
//! its credential. A failed or timed-out submission leaves no trace.
//!
//! ## Lock order
//!
//! `ledger` before `actions`. The commitment store mutex is never held
//! while either of them is.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use kyc_chain::{ChainError, ChainSubmitter, Commitment};
use kyc_core::{
    ContentDigest, CredentialId, CredentialPayload, CredentialType, FieldMap, IssuerId, Timestamp,
    WalletAddress,
};
use kyc_crypto::{CommitmentStore, InclusionProof, MerkleHash};
use kyc_state::{
    Credential, CredentialStatus, IssuanceRequest, NewCredential, VerificationSession,
};

use crate::action::{Action, ActionKind};
use crate::config::LifecycleConfig;
use crate::error::IssuanceError;
use crate::issuer::{Issuer, IssuerRegistry};
use crate::keyed_lock::KeyedLocks;
use crate::summary::{KycStatus, KycSummary};

#[derive(Default)]
struct Ledger {
    credentials: HashMap<CredentialId, Credential>,
    /// Issuance order.
    order: Vec<CredentialId>,
    by_digest: HashMap<ContentDigest, CredentialId>,
}

impl Ledger {
    fn insert(&mut self, credential: Credential) {
        self.order.push(credential.id);
        self.by_digest.insert(credential.digest, credential.id);
        self.credentials.insert(credential.id, credential);
    }

    fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.order.iter().filter_map(|id| self.credentials.get(id))
    }
}

struct Inner {
    config: LifecycleConfig,
    chain: Arc<dyn ChainSubmitter>,
    issuers: IssuerRegistry,
    store: AsyncMutex<CommitmentStore>,
    ledger: RwLock<Ledger>,
    actions: RwLock<Vec<Action>>,
    issue_locks: KeyedLocks<ContentDigest>,
    revoke_locks: KeyedLocks<CredentialId>,
}

/// Issues, revokes, expires and verifies credentials.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct CredentialLifecycleManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for CredentialLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialLifecycleManager")
            .field("network", &self.inner.chain.network())
            .field("credentials", &self.inner.ledger.read().order.len())
            .finish_non_exhaustive()
    }
}

impl CredentialLifecycleManager {
    pub fn new(
        config: LifecycleConfig,
        chain: Arc<dyn ChainSubmitter>,
        issuers: IssuerRegistry,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                chain,
                issuers,
                store: AsyncMutex::new(CommitmentStore::new()),
                ledger: RwLock::new(Ledger::default()),
                actions: RwLock::new(Vec::new()),
                issue_locks: KeyedLocks::new(),
                revoke_locks: KeyedLocks::new(),
            }),
        }
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.inner.config
    }

    /// Name of the network the chain submitter anchors to.
    pub fn network(&self) -> &str {
        self.inner.chain.network()
    }

    // -- Issuance -----------------------------------------------------------

    /// Issue a credential for a verified payload.
    ///
    /// Idempotent per payload: issuing the same type, holder and fields
    /// again returns the existing credential while it is `Verified`, and
    /// fails with `AlreadyTerminal` once it has expired or been revoked.
    pub async fn issue(
        &self,
        credential_type: CredentialType,
        holder: WalletAddress,
        issuer: IssuerId,
        fields: FieldMap,
    ) -> Result<Credential, IssuanceError> {
        let payload = CredentialPayload::new(credential_type, holder, fields);
        self.issue_payload(payload, issuer, FieldMap::new(), None)
            .await
    }

    /// Issue from a completed session's request. Without an explicit issuer
    /// the registry's default for the credential type is used.
    pub async fn issue_request(
        &self,
        request: IssuanceRequest,
        issuer: Option<IssuerId>,
    ) -> Result<Credential, IssuanceError> {
        let issuer = match issuer {
            Some(id) => id,
            None => self.default_issuer(request.credential_type())?,
        };
        let IssuanceRequest {
            payload,
            metadata,
            proof_summary,
        } = request;
        self.issue_payload(payload, issuer, metadata, proof_summary)
            .await
    }

    /// Submit a verification session and issue its credential.
    pub async fn submit_session(
        &self,
        session: VerificationSession,
        issuer: Option<IssuerId>,
    ) -> Result<Credential, IssuanceError> {
        let request = session.submit()?;
        self.issue_request(request, issuer).await
    }

    fn default_issuer(&self, ty: CredentialType) -> Result<IssuerId, IssuanceError> {
        self.inner
            .issuers
            .default_for(ty)
            .map(|issuer| issuer.id)
            .ok_or_else(|| IssuanceError::InvalidPayload(format!("no default issuer for {ty}")))
    }

    async fn issue_payload(
        &self,
        payload: CredentialPayload,
        issuer: IssuerId,
        metadata: FieldMap,
        proof_summary: Option<String>,
    ) -> Result<Credential, IssuanceError> {
        if self.inner.issuers.get(issuer).is_none() {
            return Err(IssuanceError::UnknownIssuer(issuer));
        }
        let digest = kyc_core::digest(&payload)?;

        let guard = self.inner.issue_locks.lock(digest).await;
        if let Some(existing) = self.inner.credential_for_digest(&digest) {
            if existing.status.is_terminal() {
                return Err(IssuanceError::AlreadyTerminal {
                    id: existing.id,
                    status: existing.status,
                });
            }
            tracing::info!(credential_id = %existing.id, %digest, "payload already issued");
            return Ok(existing);
        }
        {
            let store = self.inner.store.lock().await;
            if store.is_corrupt() {
                return Err(IssuanceError::StoreCorrupt(
                    "commitment store refuses writes".into(),
                ));
            }
            if let Some(entry) = store.find_by_digest(&digest) {
                return Err(IssuanceError::Internal(format!(
                    "digest {digest} committed at leaf {} has no credential",
                    entry.leaf_index
                )));
            }
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = guard;
            inner
                .submit_and_commit(payload, digest, issuer, metadata, proof_summary)
                .await
        });
        task.await
            .map_err(|e| IssuanceError::Internal(format!("issuance task failed: {e}")))?
    }

    // -- Revocation ---------------------------------------------------------

    /// Revoke a credential and record the revocation on chain.
    ///
    /// The local transition happens first and is never undone. When the
    /// chain call fails the credential stays `Revoked` and the error is
    /// `RevocationNotRecorded`; call [`retry_revocation`] later.
    ///
    /// [`retry_revocation`]: Self::retry_revocation
    pub async fn revoke(
        &self,
        id: CredentialId,
        reason: &str,
    ) -> Result<Credential, IssuanceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(IssuanceError::InvalidPayload(
                "revocation reason must not be empty".into(),
            ));
        }

        let guard = self.inner.revoke_locks.lock(id).await;
        let revoked = {
            let mut ledger = self.inner.ledger.write();
            let credential = ledger
                .credentials
                .get_mut(&id)
                .ok_or(IssuanceError::NotFound(id))?;
            credential.revoke(reason, Timestamp::now())?;
            credential.clone()
        };
        tracing::info!(credential_id = %id, credential_type = %revoked.credential_type, reason, "credential revoked");

        let inner = Arc::clone(&self.inner);
        let reason = reason.to_string();
        let task = tokio::spawn(async move {
            let _guard = guard;
            inner.record_revocation(revoked, &reason, true).await
        });
        task.await
            .map_err(|e| IssuanceError::Internal(format!("revocation task failed: {e}")))?
    }

    /// Resubmit a revocation the chain has not recorded yet.
    ///
    /// A revocation that already carries its transaction reference is
    /// returned unchanged.
    pub async fn retry_revocation(&self, id: CredentialId) -> Result<Credential, IssuanceError> {
        let guard = self.inner.revoke_locks.lock(id).await;
        let (credential, reason) = {
            let ledger = self.inner.ledger.read();
            let credential = ledger
                .credentials
                .get(&id)
                .ok_or(IssuanceError::NotFound(id))?;
            if credential.status != CredentialStatus::Revoked {
                return Err(IssuanceError::NotRevoked {
                    id,
                    status: credential.status,
                });
            }
            if !credential.revocation_pending() {
                return Ok(credential.clone());
            }
            let reason = credential.revocation_reason.clone().unwrap_or_default();
            (credential.clone(), reason)
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = guard;
            inner.record_revocation(credential, &reason, false).await
        });
        task.await
            .map_err(|e| IssuanceError::Internal(format!("revocation task failed: {e}")))?
    }

    // -- Expiry -------------------------------------------------------------

    /// Expire every `Verified` credential whose expiry time is at or before
    /// `now`. Returns the ids that changed. No actions are recorded.
    pub fn check_expiry(&self, now: Timestamp) -> Vec<CredentialId> {
        let mut ledger = self.inner.ledger.write();
        let Ledger {
            credentials, order, ..
        } = &mut *ledger;
        let mut expired = Vec::new();
        for id in order.iter() {
            if let Some(credential) = credentials.get_mut(id) {
                if credential.expire_if_due(now) {
                    tracing::info!(credential_id = %id, expiry_time = %credential.expiry_time, "credential expired");
                    expired.push(*id);
                }
            }
        }
        expired
    }

    // -- Verification -------------------------------------------------------

    /// Record that a relying party checked a credential.
    ///
    /// The credential must be `Verified`, and its commitment must still
    /// prove against the current root. A mismatch runs the store integrity
    /// check: a damaged tree is `StoreCorrupt` and poisons the store, a
    /// stale credential record is `Internal`.
    pub async fn record_verification(&self, id: CredentialId) -> Result<Action, IssuanceError> {
        let credential = self.find(id).ok_or(IssuanceError::NotFound(id))?;
        if credential.status != CredentialStatus::Verified {
            return Err(IssuanceError::NotVerified {
                id,
                status: credential.status,
            });
        }

        {
            let mut store = self.inner.store.lock().await;
            let proof = store.proof(credential.leaf_index)?;
            let root = store.current_root();
            if proof.leaf_hash != credential.merkle_leaf
                || !kyc_crypto::verify(&credential.merkle_leaf, &proof, &root)
            {
                // A damaged tree poisons the store and surfaces as StoreCorrupt.
                store.check_integrity()?;
                tracing::error!(credential_id = %id, %root, "credential record disagrees with its commitment");
                return Err(IssuanceError::Internal(format!(
                    "credential {id} does not match its commitment under root {root}"
                )));
            }
        }

        let ledger = self.inner.ledger.read();
        let status = ledger
            .credentials
            .get(&id)
            .map(|c| c.status)
            .ok_or(IssuanceError::NotFound(id))?;
        if status != CredentialStatus::Verified {
            return Err(IssuanceError::NotVerified { id, status });
        }
        let action = Action::now(id, credential.credential_type, ActionKind::Verified, None);
        self.inner.actions.write().push(action.clone());
        tracing::info!(credential_id = %id, "credential verified by relying party");
        Ok(action)
    }

    // -- Queries ------------------------------------------------------------

    pub fn find(&self, id: CredentialId) -> Option<Credential> {
        self.inner.ledger.read().credentials.get(&id).cloned()
    }

    /// All credentials in issuance order.
    pub fn list_all(&self) -> Vec<Credential> {
        self.inner.ledger.read().iter().cloned().collect()
    }

    pub fn list_by_holder(&self, holder: &WalletAddress) -> Vec<Credential> {
        self.inner
            .ledger
            .read()
            .iter()
            .filter(|c| &c.holder == holder)
            .cloned()
            .collect()
    }

    pub fn list_by_type(&self, ty: CredentialType) -> Vec<Credential> {
        self.inner
            .ledger
            .read()
            .iter()
            .filter(|c| c.credential_type == ty)
            .cloned()
            .collect()
    }

    /// The action log, oldest first.
    pub fn actions(&self) -> Vec<Action> {
        self.inner.actions.read().clone()
    }

    pub fn actions_for(&self, id: CredentialId) -> Vec<Action> {
        self.inner
            .actions
            .read()
            .iter()
            .filter(|a| a.credential_id == id)
            .cloned()
            .collect()
    }

    /// Latest credential status per flow for a holder.
    pub fn summary(&self, holder: &WalletAddress) -> KycSummary {
        let ledger = self.inner.ledger.read();
        let latest = |ty: CredentialType| -> KycStatus {
            ledger
                .iter()
                .filter(|c| &c.holder == holder && c.credential_type == ty)
                .last()
                .map(|c| c.status)
                .into()
        };
        KycSummary {
            identity: latest(CredentialType::Identity),
            human: latest(CredentialType::Human),
            age: latest(CredentialType::Age),
        }
    }

    pub fn issuers(&self) -> &[Issuer] {
        self.inner.issuers.all()
    }

    pub fn issuer(&self, id: IssuerId) -> Option<&Issuer> {
        self.inner.issuers.get(id)
    }

    // -- Commitments --------------------------------------------------------

    /// Inclusion proof for a credential against the current root.
    pub async fn inclusion_proof(&self, id: CredentialId) -> Result<InclusionProof, IssuanceError> {
        let credential = self.find(id).ok_or(IssuanceError::NotFound(id))?;
        let store = self.inner.store.lock().await;
        Ok(store.proof(credential.leaf_index)?)
    }

    /// The proof issued with the credential, against `root_at_issuance`.
    pub async fn insertion_proof(&self, id: CredentialId) -> Result<InclusionProof, IssuanceError> {
        let credential = self.find(id).ok_or(IssuanceError::NotFound(id))?;
        let store = self.inner.store.lock().await;
        store
            .proof_at_insertion(credential.leaf_index, &credential.root_at_issuance)
            .cloned()
            .ok_or_else(|| {
                IssuanceError::Internal(format!("no insertion proof for credential {id}"))
            })
    }

    pub async fn current_root(&self) -> MerkleHash {
        self.inner.store.lock().await.current_root()
    }

    pub async fn commitment_count(&self) -> u64 {
        self.inner.store.lock().await.len()
    }

    /// Recompute the tree from its leaves. A mismatch poisons the store.
    pub async fn check_integrity(&self) -> Result<MerkleHash, IssuanceError> {
        let mut store = self.inner.store.lock().await;
        let result = store.check_integrity();
        if let Err(e) = &result {
            tracing::error!(error = %e, "commitment store integrity check failed");
        }
        Ok(result?)
    }

    /// Verify a proof. Pure; needs no access to the store.
    pub fn verify(leaf: &MerkleHash, proof: &InclusionProof, root: &MerkleHash) -> bool {
        kyc_crypto::verify(leaf, proof, root)
    }
}

impl Inner {
    fn credential_for_digest(&self, digest: &ContentDigest) -> Option<Credential> {
        let ledger = self.ledger.read();
        let id = ledger.by_digest.get(digest)?;
        ledger.credentials.get(id).cloned()
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ChainError>>,
    ) -> Result<T, IssuanceError> {
        let after = self.config.submission_timeout;
        match tokio::time::timeout(after, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(IssuanceError::SubmissionFailed(e)),
            Err(_) => Err(IssuanceError::SubmissionTimeout { after }),
        }
    }

    fn expiry_for(&self, issue_time: Timestamp) -> Result<Timestamp, IssuanceError> {
        let expiry_time = issue_time
            .plus_days(self.config.validity_days)
            .map_err(|e| IssuanceError::Internal(format!("validity window: {e}")))?;
        Credential::check_validity_window(issue_time, expiry_time)?;
        Ok(expiry_time)
    }

    async fn submit_and_commit(
        &self,
        payload: CredentialPayload,
        digest: ContentDigest,
        issuer: IssuerId,
        metadata: FieldMap,
        proof_summary: Option<String>,
    ) -> Result<Credential, IssuanceError> {
        // Everything that can fail locally is settled before the chain call;
        // once a tx is confirmed the append and ledger insert must not fail.
        let issue_time = Timestamp::now();
        let expiry_time = self.expiry_for(issue_time)?;

        let commitment = Commitment {
            digest,
            credential_type: payload.credential_type,
            holder: payload.holder,
            issuer,
        };
        let tx_ref = match self.bounded(self.chain.submit(&commitment)).await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::warn!(%digest, network = self.chain.network(), error = %e, "chain submission failed");
                return Err(e);
            }
        };

        let receipt = {
            let mut store = self.store.lock().await;
            store.append(digest)?
        };
        tracing::debug!(%digest, leaf_index = receipt.leaf_index, root = %receipt.root, "commitment appended");

        let mut credential = Credential::pending(NewCredential {
            credential_type: commitment.credential_type,
            holder: commitment.holder,
            issuer,
            issue_time,
            expiry_time,
            tx_ref,
            digest,
            merkle_leaf: receipt.leaf_hash,
            leaf_index: receipt.leaf_index,
            root_at_issuance: receipt.root,
            proof_summary,
            metadata,
        })?;
        credential.confirm()?;

        let mut ledger = self.ledger.write();
        ledger.insert(credential.clone());
        self.actions.write().push(Action::now(
            credential.id,
            credential.credential_type,
            ActionKind::Issued,
            Some(tx_ref),
        ));
        tracing::info!(
            credential_id = %credential.id,
            credential_type = %credential.credential_type,
            holder = %credential.holder,
            %tx_ref,
            leaf_index = credential.leaf_index,
            "credential issued"
        );
        Ok(credential)
    }

    async fn record_revocation(
        &self,
        revoked: Credential,
        reason: &str,
        record_action: bool,
    ) -> Result<Credential, IssuanceError> {
        let outcome = self
            .bounded(self.chain.submit_revocation(revoked.id, reason))
            .await;

        let mut ledger = self.ledger.write();
        let credential = ledger
            .credentials
            .get_mut(&revoked.id)
            .ok_or(IssuanceError::NotFound(revoked.id))?;
        match outcome {
            Ok(tx_ref) => {
                credential.record_revocation_tx(tx_ref)?;
                if record_action {
                    self.actions.write().push(Action::now(
                        credential.id,
                        credential.credential_type,
                        ActionKind::Revoked,
                        Some(tx_ref),
                    ));
                }
                tracing::info!(credential_id = %credential.id, %tx_ref, "revocation recorded on chain");
                Ok(credential.clone())
            }
            Err(e) => {
                if record_action {
                    self.actions.write().push(Action::now(
                        credential.id,
                        credential.credential_type,
                        ActionKind::Revoked,
                        None,
                    ));
                }
                tracing::warn!(credential_id = %credential.id, error = %e, "revocation not recorded on chain");
                Err(IssuanceError::RevocationNotRecorded {
                    credential: Box::new(credential.clone()),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_chain::SimulatedChain;
    use std::time::Duration;

    fn manager() -> CredentialLifecycleManager {
        CredentialLifecycleManager::new(
            LifecycleConfig::new(365, Duration::from_secs(5)).unwrap(),
            Arc::new(SimulatedChain::instant()),
            IssuerRegistry::builtin().unwrap(),
        )
    }

    #[tokio::test]
    async fn unknown_issuer_is_rejected_before_chain() {
        let m = manager();
        let holder = WalletAddress::new("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap();
        let mut fields = FieldMap::new();
        fields.insert("livenessCheck".into(), serde_json::Value::Bool(true));
        let err = m
            .issue(CredentialType::Human, holder, IssuerId::new(), fields)
            .await
            .unwrap_err();
        assert!(matches!(err, IssuanceError::UnknownIssuer(_)));
        assert_eq!(m.commitment_count().await, 0);
    }

    fn human_fields() -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert("livenessCheck".into(), serde_json::Value::Bool(true));
        fields
    }

    fn holder() -> WalletAddress {
        WalletAddress::new("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap()
    }

    fn human_issuer(m: &CredentialLifecycleManager) -> IssuerId {
        m.inner
            .issuers
            .default_for(CredentialType::Human)
            .map(|issuer| issuer.id)
            .unwrap()
    }

    #[tokio::test]
    async fn unrepresentable_expiry_fails_before_chain() {
        let chain = Arc::new(SimulatedChain::instant());
        let m = CredentialLifecycleManager::new(
            LifecycleConfig {
                validity_days: u32::MAX,
                submission_timeout: Duration::from_secs(5),
            },
            chain.clone(),
            IssuerRegistry::builtin().unwrap(),
        );
        let issuer = human_issuer(&m);

        for _ in 0..2 {
            let err = m
                .issue(CredentialType::Human, holder(), issuer, human_fields())
                .await
                .unwrap_err();
            assert!(matches!(err, IssuanceError::Internal(_)), "got {err}");
        }
        assert_eq!(chain.submit_calls(), 0);
        assert_eq!(m.commitment_count().await, 0);
        assert!(m.list_all().is_empty());
        assert!(m.actions().is_empty());
    }

    #[tokio::test]
    async fn stale_record_on_verification_is_not_fatal() {
        let m = manager();
        let issuer = human_issuer(&m);
        let credential = m
            .issue(CredentialType::Human, holder(), issuer, human_fields())
            .await
            .unwrap();
        if let Some(record) = m.inner.ledger.write().credentials.get_mut(&credential.id) {
            record.merkle_leaf = MerkleHash::from_bytes([0xab; 32]);
        }

        let err = m.record_verification(credential.id).await.unwrap_err();
        assert!(matches!(err, IssuanceError::Internal(_)), "got {err}");
        assert!(!err.is_fatal());
        assert!(!m.inner.store.lock().await.is_corrupt());
        assert!(m.actions_for(credential.id).iter().all(|a| a.kind == ActionKind::Issued));

        let mut other = human_fields();
        other.insert("attempt".into(), serde_json::Value::from(2));
        m.issue(CredentialType::Human, holder(), issuer, other)
            .await
            .unwrap();
        assert_eq!(m.commitment_count().await, 2);
    }

    #[tokio::test]
    async fn empty_store_has_zero_root() {
        let m = manager();
        assert!(m.current_root().await.is_empty_root());
        assert!(m.list_all().is_empty());
        assert!(m.actions().is_empty());
    }
}
