//! # Issuers and Holder Summaries
//!
//! - `GET /v1/issuers`: Registered issuers.
//! - `GET /v1/holders/:holder/summary`: Latest status per flow.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kyc_core::WalletAddress;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssuerResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
}

/// Status of the most recent credential of each type, or `None`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub holder: String,
    pub identity: String,
    pub human: String,
    pub age: String,
}

/// Build the registry router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/issuers", get(list_issuers))
        .route("/v1/holders/:holder/summary", get(holder_summary))
}

/// GET /v1/issuers: Registered issuers.
#[utoipa::path(
    get,
    path = "/v1/issuers",
    responses((status = 200, description = "Issuers", body = Vec<IssuerResponse>)),
    tag = "registry"
)]
pub(crate) async fn list_issuers(State(state): State<AppState>) -> Json<Vec<IssuerResponse>> {
    Json(
        state
            .manager
            .issuers()
            .iter()
            .map(|issuer| IssuerResponse {
                id: *issuer.id.as_uuid(),
                name: issuer.name.clone(),
                address: issuer.address.to_string(),
            })
            .collect(),
    )
}

/// GET /v1/holders/:holder/summary: Verification overview for a wallet.
#[utoipa::path(
    get,
    path = "/v1/holders/{holder}/summary",
    params(("holder" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Summary", body = SummaryResponse),
        (status = 422, description = "Invalid wallet address", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
pub(crate) async fn holder_summary(
    State(state): State<AppState>,
    holder: Result<Path<String>, PathRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Path(raw) = holder.map_err(|err| AppError::BadRequest(err.body_text()))?;
    let holder = WalletAddress::new(raw)?;
    let summary = state.manager.summary(&holder);
    Ok(Json(SummaryResponse {
        holder: holder.to_string(),
        identity: summary.identity.as_str().to_string(),
        human: summary.human.as_str().to_string(),
        age: summary.age.as_str().to_string(),
    }))
}
