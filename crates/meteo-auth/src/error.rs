//! # Error Types
//!
//! Verification failures keep their precise cause here so the caller can log
//! it. The HTTP layer collapses every [`TokenError`] into one uniform 401.

use thiserror::Error;

/// Why a presented token was not accepted, or could not be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not match the configured key.
    #[error("token signature is invalid")]
    InvalidSignature,

    /// The `iss` claim differs from the configured issuer.
    #[error("token issuer does not match")]
    IssuerMismatch,

    /// The `aud` claim differs from the configured audience.
    #[error("token audience does not match")]
    AudienceMismatch,

    /// The current time is at or past `exp`.
    #[error("token has expired")]
    Expired,

    /// Not a structurally valid HS256 token with the required claims.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Encoding a new token failed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Malformed(err.to_string()),
        }
    }
}

/// Invalid startup configuration. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// HS256 keys shorter than the hash output are rejected.
    #[error("signing key must be at least {min} bytes, got {actual}")]
    WeakSigningKey { min: usize, actual: usize },

    #[error("token issuer must not be empty")]
    EmptyIssuer,

    #[error("token audience must not be empty")]
    EmptyAudience,

    #[error("token lifetime must be positive, got {0} seconds")]
    InvalidTtl(i64),

    #[error("token lifetime must be at most {max} seconds, got {actual}")]
    TtlTooLong { max: i64, actual: i64 },

    #[error("API key {0:?} has an empty secret")]
    EmptyApiKey(String),

    #[error("duplicate API key label {0:?}")]
    DuplicateApiKey(String),

    /// The users file could not be read or parsed.
    #[error("user store: {0}")]
    UserStore(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

/// Login could not produce an identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// Unknown email or wrong password. Deliberately undistinguished.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The identity source failed for reasons unrelated to the caller.
    #[error("identity source unavailable: {0}")]
    Unavailable(String),
}

/// The scheme registry could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("security scheme registry unavailable: {0}")]
pub struct RegistryError(pub String);
