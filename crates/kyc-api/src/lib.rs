//! # kyc-api: HTTP Service for the KYC Credential Pipeline
//!
//! Exposes the [`CredentialLifecycleManager`](kyc_issuance::CredentialLifecycleManager)
//! over HTTP.
//!
//! ## API Surface
//!
//! | Prefix                 | Module                      |
//! |------------------------|-----------------------------|
//! | `/v1/credentials/*`    | [`routes::credentials`]     |
//! | `/v1/commitments/*`    | [`routes::commitments`]     |
//! | `/v1/proofs/*`         | [`routes::commitments`]     |
//! | `/v1/actions`          | [`routes::audit`]           |
//! | `/v1/issuers`          | [`routes::registry`]        |
//! | `/v1/holders/*`        | [`routes::registry`]        |
//! | `/v1/maintenance/*`    | [`routes::maintenance`]     |
//!
//! Every error is a JSON body `{"error": {"code", "message", "retryable"}}`.
//!
//! ## OpenAPI
//!
//! Generated by utoipa derive macros, served at `/openapi.json`.

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::credentials::router())
        .merge(routes::commitments::router())
        .merge(routes::audit::router())
        .merge(routes::registry::router())
        .merge(routes::maintenance::router())
        .merge(openapi::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
