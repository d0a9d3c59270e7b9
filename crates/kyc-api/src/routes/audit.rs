//! # Audit Log
//!
//! - `GET /v1/actions`: The append-only action log, oldest first,
//!   optionally restricted to one credential.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kyc_core::CredentialId;
use kyc_issuance::Action;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::routes::credentials::explorer_link;
use crate::state::AppState;

/// One audit entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub id: Uuid,
    pub credential_id: Uuid,
    #[serde(rename = "type")]
    pub credential_type: String,
    /// `Issued`, `Revoked` or `Verified`.
    pub kind: String,
    pub timestamp: String,
    pub tx_ref: Option<String>,
    pub explorer_url: Option<String>,
}

impl ActionResponse {
    pub fn from_action(action: &Action, state: &AppState) -> Self {
        Self {
            id: *action.id.as_uuid(),
            credential_id: *action.credential_id.as_uuid(),
            credential_type: action.credential_type.to_string(),
            kind: action.kind.to_string(),
            timestamp: action.timestamp.to_iso8601(),
            tx_ref: action.tx_ref.map(|tx| tx.to_string()),
            explorer_url: action.tx_ref.and_then(|tx| explorer_link(state, &tx)),
        }
    }
}

/// Query parameters for the action log.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionsQuery {
    pub credential_id: Option<Uuid>,
}

/// Build the audit router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/actions", get(list_actions))
}

/// GET /v1/actions: The action log.
#[utoipa::path(
    get,
    path = "/v1/actions",
    params(("credentialId" = Option<Uuid>, Query, description = "Only actions for this credential")),
    responses(
        (status = 200, description = "Actions, oldest first", body = Vec<ActionResponse>),
    ),
    tag = "audit"
)]
pub(crate) async fn list_actions(
    State(state): State<AppState>,
    query: Result<Query<ActionsQuery>, QueryRejection>,
) -> Result<Json<Vec<ActionResponse>>, AppError> {
    let query = extract_query(query)?;
    let actions = match query.credential_id {
        Some(id) => state.manager.actions_for(CredentialId::from_uuid(id)),
        None => state.manager.actions(),
    };
    Ok(Json(
        actions
            .iter()
            .map(|a| ActionResponse::from_action(a, &state))
            .collect(),
    ))
}
