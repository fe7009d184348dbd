//! # Credential Verifier
//!
//! Checks a presented token against the same [`TokenConfig`] used to issue it.
//!
//! ## Check order
//!
//! 1. signature → [`TokenError::InvalidSignature`]
//! 2. issuer → [`TokenError::IssuerMismatch`]
//! 3. audience → [`TokenError::AudienceMismatch`]
//! 4. `now < exp` → [`TokenError::Expired`]
//!
//! The JWT backend performs 1–3. Expiry is checked here against an explicit
//! clock with zero leeway, after the claims are otherwise trusted.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::{Claims, Identity};
use crate::config::TokenConfig;
use crate::error::TokenError;

/// Validates HS256 bearer tokens. Stateless and cheap; safe to share.
pub struct CredentialVerifier {
    config: TokenConfig,
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    pub fn new(config: TokenConfig) -> Self {
        let key = DecodingKey::from_secret(config.secret().expose());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer()]);
        validation.set_audience(&[config.audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            config,
            key,
            validation,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        if now.timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(data.claims.into())
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("config", &self.config)
            .finish()
    }
}
