//! # Login
//!
//! Routes:
//! - POST /v1/login: exchange email and password for a bearer token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorBody};
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

#[derive(Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), String> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err("email must not be empty".into());
        }
        if !email.contains('@') {
            return Err("email must contain '@'".into());
        }
        Ok(())
    }
}

#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// HS256 JWT to send as `Authorization: Bearer <token>`.
    pub access_token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// POST /v1/login: Issue a bearer token for the resolved identity.
#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed body", body = ErrorBody),
        (status = 401, description = "Credentials rejected", body = ErrorBody),
        (status = 422, description = "Validation error", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let identity = state
        .identities
        .authenticate(req.email.trim(), &req.password)
        .await?;
    let credential = state
        .issuer
        .issue(&identity)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(
        subject = %identity.subject,
        expires_at = %credential.expires_at(),
        "issued access token"
    );
    Ok(Json(LoginResponse {
        access_token: credential.into_token(),
    }))
}
