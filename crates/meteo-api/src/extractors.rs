//! # Request Body Validation
//!
//! Login-style handlers take `Result<Json<T>, JsonRejection>` so that a
//! malformed body and a well-formed body that breaks a rule surface as
//! different [`AppError`]s (400 and 422) with the uniform error envelope.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Business rules a request body must satisfy beyond deserialization.
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap a JSON body and check its rules.
///
/// Rejections become [`AppError::BadRequest`]; rule failures become
/// [`AppError::Validation`].
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = result.map_err(|err| AppError::BadRequest(err.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
