//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps routing, login and document errors to HTTP status codes and a JSON
//! body of the form `{ "error": { "code", "message", "details"? } }`.
//!
//! Every authentication failure renders the same 401 body. The precise reason
//! is logged where the failure is detected and never returned to the caller.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use meteo_auth::LoginError;
use meteo_core::{ApiVersion, RoutingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Response header listing every version that serves a resource.
pub const API_SUPPORTED_VERSIONS: &str = "api-supported-versions";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "UNAUTHORIZED", "UNSUPPORTED_API_VERSION").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown resource or document (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The resource exists but not for this method (405).
    #[error("method {method} not allowed")]
    MethodNotAllowed { method: Method, allowed: Vec<Method> },

    /// Malformed, missing or unoffered API version (400).
    #[error(
        "unsupported API version {} for {resource}",
        .requested.as_deref().unwrap_or("(unspecified)")
    )]
    UnsupportedVersion {
        /// The version token as presented, if any.
        requested: Option<String>,
        resource: String,
        supported: Vec<ApiVersion>,
    },

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Any authentication failure (401). Carries no reason on purpose.
    #[error("authentication required")]
    Unauthorized,

    /// A dependency could not serve the request right now (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::MethodNotAllowed { .. } => (StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED"),
            Self::UnsupportedVersion { .. } => (StatusCode::BAD_REQUEST, "UNSUPPORTED_API_VERSION"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::UnsupportedVersion {
                requested,
                supported,
                ..
            } => Some(serde_json::json!({
                "requested": requested,
                "supported": supported,
            })),
            Self::MethodNotAllowed { allowed, .. } => Some(serde_json::json!({
                "allowed": allowed.iter().map(Method::as_str).collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        let mut response = (status, Json(body)).into_response();
        let headers = response.headers_mut();
        match &self {
            Self::Unauthorized => {
                headers.insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            Self::UnsupportedVersion { supported, .. } => {
                if let Ok(value) = HeaderValue::from_str(&ApiVersion::join(supported)) {
                    headers.insert(API_SUPPORTED_VERSIONS, value);
                }
            }
            Self::MethodNotAllowed { allowed, .. } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    headers.insert(header::ALLOW, value);
                }
            }
            _ => {}
        }
        response
    }
}

impl From<RoutingError> for AppError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::UnsupportedVersion {
                requested,
                resource,
                supported,
            } => Self::UnsupportedVersion {
                requested: requested.as_str().map(str::to_string),
                resource,
                supported,
            },
            RoutingError::RouteNotFound(resource) => Self::NotFound(resource),
            RoutingError::MethodNotAllowed {
                method, allowed, ..
            } => Self::MethodNotAllowed { method, allowed },
            other @ (RoutingError::DuplicateRoute { .. } | RoutingError::InvalidPattern(_)) => {
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => {
                tracing::warn!("login rejected: invalid credentials");
                Self::Unauthorized
            }
            LoginError::Unavailable(reason) => Self::ServiceUnavailable(reason),
        }
    }
}
