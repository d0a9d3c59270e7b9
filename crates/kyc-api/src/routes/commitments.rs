//! # Commitments and Inclusion Proofs
//!
//! ## Endpoints
//!
//! - `GET  /v1/commitments/root`: Current root and leaf count.
//! - `GET  /v1/credentials/:id/proof`: Inclusion proof for a credential,
//!   against the current root or the root at issuance (`?at=issuance`).
//! - `POST /v1/proofs/verify`: Check a proof without touching the store.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kyc_crypto::{InclusionProof, MerkleHash};

use crate::error::AppError;
use crate::extractors::{extract_credential_id, extract_json, extract_query};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Current state of the commitment store.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    /// Current root; all zeros when the store is empty.
    pub root: String,
    /// Number of committed leaves.
    pub size: u64,
    /// Network the commitments are anchored on.
    pub network: String,
}

/// Which root a proof should be built against.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProofAnchor {
    #[default]
    Current,
    Issuance,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProofQuery {
    #[serde(default)]
    pub at: ProofAnchor,
}

/// An inclusion proof for one credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProofResponse {
    pub credential_id: Uuid,
    /// The root the proof is against.
    pub root: String,
    /// `{leafIndex, treeSize, leafHash, path, root}`.
    #[schema(value_type = Object)]
    pub proof: InclusionProof,
    /// Whether the proof verifies for the credential's leaf.
    pub valid: bool,
}

/// Request body for offline proof verification.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyProofRequest {
    /// Leaf hash, hex with `0x` prefix.
    #[schema(value_type = String)]
    pub leaf: MerkleHash,
    #[schema(value_type = Object)]
    pub proof: InclusionProof,
    /// Expected root; defaults to the root recorded in the proof.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub root: Option<MerkleHash>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyProofResponse {
    pub valid: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the commitments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/commitments/root", get(current_root))
        .route("/v1/credentials/:id/proof", get(credential_proof))
        .route("/v1/proofs/verify", post(verify_proof))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/commitments/root: Current root.
#[utoipa::path(
    get,
    path = "/v1/commitments/root",
    responses((status = 200, description = "Current root", body = RootResponse)),
    tag = "commitments"
)]
pub(crate) async fn current_root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        root: state.manager.current_root().await.to_string(),
        size: state.manager.commitment_count().await,
        network: state.manager.network().to_string(),
    })
}

/// GET /v1/credentials/:id/proof: Inclusion proof for a credential.
#[utoipa::path(
    get,
    path = "/v1/credentials/{id}/proof",
    params(
        ("id" = Uuid, Path, description = "Credential ID"),
        ("at" = Option<String>, Query, description = "`current` (default) or `issuance`"),
    ),
    responses(
        (status = 200, description = "Inclusion proof", body = CredentialProofResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "commitments"
)]
pub(crate) async fn credential_proof(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<ProofQuery>, QueryRejection>,
) -> Result<Json<CredentialProofResponse>, AppError> {
    let id = extract_credential_id(id)?;
    let query = extract_query(query)?;
    let credential = state
        .manager
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))?;

    let (proof, root) = match query.at {
        ProofAnchor::Current => {
            let proof = state.manager.inclusion_proof(id).await?;
            let root = proof.root;
            (proof, root)
        }
        ProofAnchor::Issuance => (
            state.manager.insertion_proof(id).await?,
            credential.root_at_issuance,
        ),
    };
    let valid = kyc_crypto::verify(&credential.merkle_leaf, &proof, &root);

    Ok(Json(CredentialProofResponse {
        credential_id: *id.as_uuid(),
        root: root.to_string(),
        proof,
        valid,
    }))
}

/// POST /v1/proofs/verify: Verify an inclusion proof.
#[utoipa::path(
    post,
    path = "/v1/proofs/verify",
    request_body = VerifyProofRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyProofResponse),
        (status = 400, description = "Malformed proof", body = crate::error::ErrorBody),
    ),
    tag = "commitments"
)]
pub(crate) async fn verify_proof(
    body: Result<Json<VerifyProofRequest>, JsonRejection>,
) -> Result<Json<VerifyProofResponse>, AppError> {
    let req = extract_json(body)?;
    let root = req.root.unwrap_or(req.proof.root);
    Ok(Json(VerifyProofResponse {
        valid: kyc_crypto::verify(&req.leaf, &req.proof, &root),
    }))
}
