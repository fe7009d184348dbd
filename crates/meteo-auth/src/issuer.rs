//! # Credential Issuer
//!
//! Turns an [`Identity`] into an HS256-signed JWT carrying
//! `{sub, email, iss, aud, iat, exp}` with `exp = iat + ttl`. Nothing is
//! stored server-side.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::claims::{Claims, Identity};
use crate::config::TokenConfig;
use crate::error::TokenError;

/// A freshly issued bearer token.
#[derive(Clone)]
pub struct Credential {
    token: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// The compact `header.payload.signature` form.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn into_token(self) -> String {
        self.token
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Signs tokens with the configured symmetric key.
pub struct CredentialIssuer {
    config: TokenConfig,
    key: EncodingKey,
    header: Header,
}

impl CredentialIssuer {
    pub fn new(config: TokenConfig) -> Self {
        let key = EncodingKey::from_secret(config.secret().expose());
        Self {
            config,
            key,
            header: Header::new(Algorithm::HS256),
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a token valid from now until now + ttl.
    pub fn issue(&self, identity: &Identity) -> Result<Credential, TokenError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if at `issued_at`.
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<Credential, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.config.ttl())
            .ok_or_else(|| TokenError::Signing("expiry out of range".into()))?;
        let claims = Claims {
            sub: identity.subject.clone(),
            email: identity.email.clone(),
            iss: self.config.issuer().to_string(),
            aud: self.config.audience().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&self.header, &claims, &self.key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(Credential {
            token,
            issued_at,
            expires_at,
        })
    }
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("config", &self.config)
            .field("alg", &self.header.alg)
            .finish()
    }
}
