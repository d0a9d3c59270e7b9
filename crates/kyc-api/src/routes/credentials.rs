//! # Credential Issuance and Lifecycle
//!
//! Endpoints that drive the credential lifecycle: issue, read, revoke
//! (with chain recording and retry), and relying-party verification.
//!
//! ## Endpoints
//!
//! - `POST /v1/credentials`: Issue a credential for a verified payload.
//! - `GET  /v1/credentials`: List, optionally filtered by holder and type.
//! - `GET  /v1/credentials/:id`: Fetch one credential.
//! - `POST /v1/credentials/:id/revoke`: Revoke with a reason.
//! - `POST /v1/credentials/:id/revocation/retry`: Re-record a revocation.
//! - `POST /v1/credentials/:id/verify`: Log a relying-party check.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kyc_core::{CredentialPayload, CredentialType, IssuerId, TxRef, WalletAddress};
use kyc_state::{Credential, IssuanceRequest};

use crate::error::AppError;
use crate::extractors::{
    extract_credential_id, extract_query, extract_validated_json, Validate,
};
use crate::routes::audit::ActionResponse;
use crate::state::AppState;

/// Upper bound on payload and metadata entries per request.
const MAX_FIELDS: usize = 64;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request body for credential issuance.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    /// Verification flow: `Identity`, `Human` or `Age`.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Wallet address the credential is bound to.
    pub holder: String,
    /// Issuer; defaults to the registry's issuer for the type.
    #[serde(default)]
    pub issuer_id: Option<Uuid>,
    /// Verified fields that get hashed and committed.
    #[schema(value_type = Object)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// Display metadata stored on the credential, never hashed.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Human-readable description of the proof.
    #[serde(default)]
    pub proof_summary: Option<String>,
}

impl Validate for IssueCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.fields.len() > MAX_FIELDS || self.metadata.len() > MAX_FIELDS {
            return Err(format!(
                "fields and metadata must not exceed {MAX_FIELDS} entries each"
            ));
        }
        Ok(())
    }
}

/// Query parameters for listing credentials.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListCredentialsQuery {
    /// Only credentials bound to this wallet.
    pub holder: Option<String>,
    /// Only credentials of this type.
    #[serde(rename = "type")]
    pub credential_type: Option<String>,
}

/// Request body for revocation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeRequest {
    /// Why the credential is revoked. Must not be blank.
    pub reason: String,
}

impl Validate for RevokeRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        if self.reason.len() > 1000 {
            return Err("reason must not exceed 1000 characters".to_string());
        }
        Ok(())
    }
}

/// A credential as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub holder: String,
    pub issuer: Uuid,
    pub status: String,
    pub issue_time: String,
    pub expiry_time: String,
    pub tx_ref: String,
    /// Explorer link for `txRef`.
    pub explorer_url: Option<String>,
    pub digest: String,
    pub merkle_leaf: String,
    pub leaf_index: u64,
    pub root_at_issuance: String,
    pub proof_summary: Option<String>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub revocation_reason: Option<String>,
    pub revoked_at: Option<String>,
    pub revocation_tx_ref: Option<String>,
}

impl CredentialResponse {
    pub fn from_credential(credential: &Credential, state: &AppState) -> Self {
        Self {
            id: *credential.id.as_uuid(),
            credential_type: credential.credential_type.to_string(),
            holder: credential.holder.to_string(),
            issuer: *credential.issuer.as_uuid(),
            status: credential.status.to_string(),
            issue_time: credential.issue_time.to_iso8601(),
            expiry_time: credential.expiry_time.to_iso8601(),
            tx_ref: credential.tx_ref.to_string(),
            explorer_url: explorer_link(state, &credential.tx_ref),
            digest: credential.digest.to_hex(),
            merkle_leaf: credential.merkle_leaf.to_string(),
            leaf_index: credential.leaf_index,
            root_at_issuance: credential.root_at_issuance.to_string(),
            proof_summary: credential.proof_summary.clone(),
            metadata: serde_json::Value::Object(
                credential
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            revocation_reason: credential.revocation_reason.clone(),
            revoked_at: credential.revoked_at.map(|t| t.to_iso8601()),
            revocation_tx_ref: credential.revocation_tx_ref.map(|tx| tx.to_string()),
        }
    }
}

pub(crate) fn explorer_link(state: &AppState, tx: &TxRef) -> Option<String> {
    state.chain.explorer_url(tx).ok().map(String::from)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/credentials",
            post(issue_credential).get(list_credentials),
        )
        .route("/v1/credentials/:id", get(get_credential))
        .route("/v1/credentials/:id/revoke", post(revoke_credential))
        .route(
            "/v1/credentials/:id/revocation/retry",
            post(retry_revocation),
        )
        .route("/v1/credentials/:id/verify", post(record_verification))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/credentials: Issue a credential.
///
/// Re-posting an identical payload returns the credential already issued
/// for it, so clients can retry after a timeout.
#[utoipa::path(
    post,
    path = "/v1/credentials",
    request_body = IssueCredentialRequest,
    responses(
        (status = 201, description = "Credential issued", body = CredentialResponse),
        (status = 409, description = "Payload belongs to a revoked or expired credential", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid payload", body = crate::error::ErrorBody),
        (status = 503, description = "Chain unavailable", body = crate::error::ErrorBody),
        (status = 504, description = "Chain submission timed out", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn issue_credential(
    State(state): State<AppState>,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CredentialResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let credential_type: CredentialType = req.credential_type.parse()?;
    let holder = WalletAddress::new(req.holder)?;

    let request = IssuanceRequest {
        payload: CredentialPayload::new(
            credential_type,
            holder,
            req.fields.into_iter().collect(),
        ),
        metadata: req.metadata.into_iter().collect(),
        proof_summary: req.proof_summary,
    };
    let credential = state
        .manager
        .issue_request(request, req.issuer_id.map(IssuerId::from_uuid))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CredentialResponse::from_credential(&credential, &state)),
    ))
}

/// GET /v1/credentials: List credentials in issuance order.
#[utoipa::path(
    get,
    path = "/v1/credentials",
    params(
        ("holder" = Option<String>, Query, description = "Filter by wallet address"),
        ("type" = Option<String>, Query, description = "Filter by credential type"),
    ),
    responses(
        (status = 200, description = "Credentials", body = Vec<CredentialResponse>),
        (status = 422, description = "Invalid filter", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn list_credentials(
    State(state): State<AppState>,
    query: Result<Query<ListCredentialsQuery>, QueryRejection>,
) -> Result<Json<Vec<CredentialResponse>>, AppError> {
    let query = extract_query(query)?;
    let holder = query.holder.map(WalletAddress::new).transpose()?;
    let credential_type = query
        .credential_type
        .map(|t| t.parse::<CredentialType>())
        .transpose()?;

    let credentials = match &holder {
        Some(holder) => state.manager.list_by_holder(holder),
        None => state.manager.list_all(),
    };
    let items = credentials
        .iter()
        .filter(|c| credential_type.map_or(true, |t| c.credential_type == t))
        .map(|c| CredentialResponse::from_credential(c, &state))
        .collect();
    Ok(Json(items))
}

/// GET /v1/credentials/:id: Fetch one credential.
#[utoipa::path(
    get,
    path = "/v1/credentials/{id}",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Credential", body = CredentialResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn get_credential(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CredentialResponse>, AppError> {
    let id = extract_credential_id(id)?;
    let credential = state
        .manager
        .find(id)
        .ok_or_else(|| AppError::NotFound(format!("credential {id} not found")))?;
    Ok(Json(CredentialResponse::from_credential(&credential, &state)))
}

/// POST /v1/credentials/:id/revoke: Revoke a credential.
///
/// The revocation takes effect immediately. If the chain does not record
/// it, the response is a retryable 502 and the credential stays revoked.
#[utoipa::path(
    post,
    path = "/v1/credentials/{id}/revoke",
    params(("id" = Uuid, Path, description = "Credential ID")),
    request_body = RevokeRequest,
    responses(
        (status = 200, description = "Credential revoked", body = CredentialResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already revoked or expired", body = crate::error::ErrorBody),
        (status = 502, description = "Revoked locally, not recorded on chain", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn revoke_credential(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<RevokeRequest>, JsonRejection>,
) -> Result<Json<CredentialResponse>, AppError> {
    let id = extract_credential_id(id)?;
    let req = extract_validated_json(body)?;
    let credential = state.manager.revoke(id, &req.reason).await?;
    Ok(Json(CredentialResponse::from_credential(&credential, &state)))
}

/// POST /v1/credentials/:id/revocation/retry: Re-record a revocation.
#[utoipa::path(
    post,
    path = "/v1/credentials/{id}/revocation/retry",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Revocation recorded", body = CredentialResponse),
        (status = 409, description = "Credential is not revoked", body = crate::error::ErrorBody),
        (status = 502, description = "Chain still not recording", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn retry_revocation(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<CredentialResponse>, AppError> {
    let id = extract_credential_id(id)?;
    let credential = state.manager.retry_revocation(id).await?;
    Ok(Json(CredentialResponse::from_credential(&credential, &state)))
}

/// POST /v1/credentials/:id/verify: Log a relying-party verification.
#[utoipa::path(
    post,
    path = "/v1/credentials/{id}/verify",
    params(("id" = Uuid, Path, description = "Credential ID")),
    responses(
        (status = 200, description = "Verification recorded", body = ActionResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Credential is not verified", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn record_verification(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<ActionResponse>, AppError> {
    let id = extract_credential_id(id)?;
    let action = state.manager.record_verification(id).await?;
    Ok(Json(ActionResponse::from_action(&action, &state)))
}
