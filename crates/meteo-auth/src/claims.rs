//! # Identity and Token Claims

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Opaque subject identifier (`sub`).
    pub subject: String,
    pub email: String,
}

impl Identity {
    pub fn new(subject: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: email.into(),
        }
    }

    /// An identity with a freshly minted random subject.
    pub fn ephemeral(email: impl Into<String>) -> Self {
        Self::new(Uuid::new_v4().to_string(), email)
    }
}

/// Wire claims carried inside the signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub aud: String,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            email: claims.email,
        }
    }
}
