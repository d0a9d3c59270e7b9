//! # Request Extraction & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers that turn
//! axum rejections into [`AppError`]s, so every malformed request gets the
//! same JSON error body.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use uuid::Uuid;

use kyc_core::CredentialId;

use crate::error::AppError;

/// Business rules beyond what serde checks.
pub trait Validate {
    /// Returns an error message on failure.
    fn validate(&self) -> Result<(), String>;
}

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}

/// Extract query parameters, mapping errors to [`AppError::BadRequest`].
pub fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a credential id from the path.
pub fn extract_credential_id(
    result: Result<Path<Uuid>, PathRejection>,
) -> Result<CredentialId, AppError> {
    result
        .map(|Path(id)| CredentialId::from_uuid(id))
        .map_err(|err| AppError::BadRequest(err.body_text()))
}
