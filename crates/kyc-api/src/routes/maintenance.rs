//! # Maintenance
//!
//! - `POST /v1/maintenance/expire`: Run the expiry sweep, optionally at
//!   an explicit instant (`?now=2026-01-15T12:00:00Z`).

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use kyc_core::Timestamp;

use crate::error::AppError;
use crate::extractors::extract_query;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExpireQuery {
    /// RFC 3339 instant; defaults to now.
    pub now: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpireResponse {
    pub checked_at: String,
    /// Credentials that moved to `Expired`.
    pub expired: Vec<Uuid>,
}

/// Build the maintenance router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/maintenance/expire", post(run_expiry))
}

/// POST /v1/maintenance/expire: Expire due credentials.
#[utoipa::path(
    post,
    path = "/v1/maintenance/expire",
    params(("now" = Option<String>, Query, description = "RFC 3339 instant to check against")),
    responses(
        (status = 200, description = "Sweep result", body = ExpireResponse),
        (status = 422, description = "Invalid timestamp", body = crate::error::ErrorBody),
    ),
    tag = "maintenance"
)]
pub(crate) async fn run_expiry(
    State(state): State<AppState>,
    query: Result<Query<ExpireQuery>, QueryRejection>,
) -> Result<Json<ExpireResponse>, AppError> {
    let query = extract_query(query)?;
    let now = match query.now.as_deref() {
        Some(raw) => Timestamp::parse(raw)?,
        None => Timestamp::now(),
    };
    let expired = state.manager.check_expiry(now);
    tracing::info!(checked_at = %now, count = expired.len(), "expiry sweep finished");
    Ok(Json(ExpireResponse {
        checked_at: now.to_iso8601(),
        expired: expired.iter().map(|id| *id.as_uuid()).collect(),
    }))
}
