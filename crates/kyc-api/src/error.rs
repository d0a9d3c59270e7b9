//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Lifecycle errors keep their own machine-readable code and retry hint;
//! request-level failures (bad JSON, unparseable ids) get generic codes.
//! Messages of 500-class errors are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use kyc_chain::ChainError;
use kyc_core::ValidationError;
use kyc_issuance::IssuanceError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "SUBMISSION_TIMEOUT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Whether repeating the same request can succeed.
    pub retryable: bool,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or path could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A lifecycle operation failed; status follows the error kind.
    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Issuance(err) => (issuance_status(err), err.code()),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Issuance(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn hides_message(&self) -> bool {
        self.status_and_code().0 == StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn issuance_status(err: &IssuanceError) -> StatusCode {
    match err {
        IssuanceError::InvalidPayload(_)
        | IssuanceError::Session(_)
        | IssuanceError::UnknownIssuer(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IssuanceError::NotFound(_) => StatusCode::NOT_FOUND,
        IssuanceError::AlreadyTerminal { .. }
        | IssuanceError::NotRevoked { .. }
        | IssuanceError::NotVerified { .. }
        | IssuanceError::Lifecycle(_) => StatusCode::CONFLICT,
        IssuanceError::SubmissionFailed(ChainError::Unavailable { .. }) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        IssuanceError::SubmissionFailed(_) | IssuanceError::RevocationNotRecorded { .. } => {
            StatusCode::BAD_GATEWAY
        }
        IssuanceError::SubmissionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        IssuanceError::StoreCorrupt(_) | IssuanceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if self.hides_message() {
            tracing::error!(error = %self, code, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                retryable: self.retryable(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Malformed identifiers and addresses in requests are client errors.
impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::CredentialId;
    use kyc_state::CredentialStatus;
    use std::time::Duration;

    fn status(err: AppError) -> (StatusCode, &'static str, bool) {
        let retryable = err.retryable();
        let (status, code) = err.status_and_code();
        (status, code, retryable)
    }

    #[test]
    fn request_errors_map_to_client_statuses() {
        assert_eq!(
            status(AppError::NotFound("x".into())),
            (StatusCode::NOT_FOUND, "NOT_FOUND", false)
        );
        assert_eq!(
            status(AppError::Validation("x".into())),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", false)
        );
        assert_eq!(
            status(AppError::BadRequest("x".into())),
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", false)
        );
    }

    #[test]
    fn chain_failures_are_gateway_errors() {
        let unavailable = IssuanceError::SubmissionFailed(ChainError::Unavailable {
            network: "polygon".into(),
            reason: "rpc down".into(),
        });
        assert_eq!(
            status(unavailable.into()),
            (StatusCode::SERVICE_UNAVAILABLE, "SUBMISSION_FAILED", true)
        );

        let rejected = IssuanceError::SubmissionFailed(ChainError::Rejected {
            network: "polygon".into(),
            reason: "nonce too low".into(),
        });
        assert_eq!(status(rejected.into()).0, StatusCode::BAD_GATEWAY);

        let timeout = IssuanceError::SubmissionTimeout {
            after: Duration::from_secs(30),
        };
        assert_eq!(
            status(timeout.into()),
            (StatusCode::GATEWAY_TIMEOUT, "SUBMISSION_TIMEOUT", true)
        );
    }

    #[test]
    fn terminal_conflicts_are_409() {
        let err = IssuanceError::AlreadyTerminal {
            id: CredentialId::new(),
            status: CredentialStatus::Expired,
        };
        assert_eq!(
            status(err.into()),
            (StatusCode::CONFLICT, "ALREADY_TERMINAL", false)
        );
    }

    #[test]
    fn store_corruption_hides_its_message() {
        let err = AppError::from(IssuanceError::StoreCorrupt("root mismatch".into()));
        assert!(err.hides_message());
        assert_eq!(err.status_and_code().1, "STORE_CORRUPT");
        assert!(!AppError::Validation("bad".into()).hides_message());
    }

    #[test]
    fn error_body_serializes() {
        let body = ErrorBody {
            error: ErrorDetail {
                code: "TEST".to_string(),
                message: "test message".to_string(),
                retryable: false,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "TEST");
        assert_eq!(json["error"]["retryable"], false);
    }
}
