//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "KYC Credential Pipeline API",
        version = "0.1.0",
        description = "Issue, revoke, expire and verify KYC credentials anchored as Merkle commitments.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Credentials
        crate::routes::credentials::issue_credential,
        crate::routes::credentials::list_credentials,
        crate::routes::credentials::get_credential,
        crate::routes::credentials::revoke_credential,
        crate::routes::credentials::retry_revocation,
        crate::routes::credentials::record_verification,
        // Commitments
        crate::routes::commitments::current_root,
        crate::routes::commitments::credential_proof,
        crate::routes::commitments::verify_proof,
        // Audit
        crate::routes::audit::list_actions,
        // Registry
        crate::routes::registry::list_issuers,
        crate::routes::registry::holder_summary,
        // Maintenance
        crate::routes::maintenance::run_expiry,
    ),
    components(schemas(
        crate::routes::credentials::IssueCredentialRequest,
        crate::routes::credentials::RevokeRequest,
        crate::routes::credentials::CredentialResponse,
        crate::routes::commitments::RootResponse,
        crate::routes::commitments::CredentialProofResponse,
        crate::routes::commitments::VerifyProofRequest,
        crate::routes::commitments::VerifyProofResponse,
        crate::routes::audit::ActionResponse,
        crate::routes::registry::IssuerResponse,
        crate::routes::registry::SummaryResponse,
        crate::routes::maintenance::ExpireResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "credentials", description = "Credential issuance and lifecycle"),
        (name = "commitments", description = "Merkle commitments and inclusion proofs"),
        (name = "audit", description = "Append-only action log"),
        (name = "registry", description = "Issuers and holder summaries"),
        (name = "maintenance", description = "Expiry sweeps"),
    )
)]
pub struct ApiDoc;

/// Router serving the spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        let paths: Vec<_> = spec.paths.paths.keys().cloned().collect();
        for expected in [
            "/v1/credentials",
            "/v1/credentials/{id}",
            "/v1/credentials/{id}/revoke",
            "/v1/credentials/{id}/revocation/retry",
            "/v1/credentials/{id}/verify",
            "/v1/credentials/{id}/proof",
            "/v1/commitments/root",
            "/v1/proofs/verify",
            "/v1/actions",
            "/v1/issuers",
            "/v1/holders/{holder}/summary",
            "/v1/maintenance/expire",
        ] {
            assert!(paths.iter().any(|p| p == expected), "missing {expected}");
        }
    }
}
