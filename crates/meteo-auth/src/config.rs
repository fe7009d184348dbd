//! # Token Configuration
//!
//! One explicit value carries the signing key, issuer, audience and token
//! lifetime into both the issuer and the verifier. It is validated when it is
//! built, so a running service never holds a half-configured key.

use chrono::Duration;
use zeroize::Zeroizing;

use crate::error::ConfigError;

/// HS256 keys shorter than the SHA-256 output are refused.
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Default token lifetime: seven days.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Symmetric signing key. Zeroed on drop and never printed.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Raw key bytes, for handing to the JWT backend.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret([REDACTED])")
    }
}

/// Validated key, issuer, audience and lifetime shared by issuer and verifier.
#[derive(Clone)]
pub struct TokenConfig {
    secret: SigningSecret,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenConfig {
    /// Build a config with the default seven-day lifetime.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::WeakSigningKey`] if the key is under
    ///   [`MIN_SIGNING_KEY_BYTES`].
    /// - [`ConfigError::EmptyIssuer`] / [`ConfigError::EmptyAudience`] for
    ///   blank values.
    pub fn new(
        secret: impl Into<Vec<u8>>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let secret = SigningSecret::new(secret);
        if secret.len() < MIN_SIGNING_KEY_BYTES {
            return Err(ConfigError::WeakSigningKey {
                min: MIN_SIGNING_KEY_BYTES,
                actual: secret.len(),
            });
        }
        let issuer = issuer.into();
        if issuer.trim().is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        let audience = audience.into();
        if audience.trim().is_empty() {
            return Err(ConfigError::EmptyAudience);
        }
        Ok(Self {
            secret,
            issuer,
            audience,
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        })
    }

    /// Override the token lifetime.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidTtl`] for zero or negative lifetimes.
    /// - [`ConfigError::TtlTooLong`] above [`MAX_TOKEN_TTL_SECS`].
    pub fn with_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        if ttl <= Duration::zero() {
            return Err(ConfigError::InvalidTtl(ttl.num_seconds()));
        }
        if ttl > Duration::seconds(MAX_TOKEN_TTL_SECS) {
            return Err(ConfigError::TtlTooLong {
                max: MAX_TOKEN_TTL_SECS,
                actual: ttl.num_seconds(),
            });
        }
        self.ttl = ttl;
        Ok(self)
    }

    pub fn secret(&self) -> &SigningSecret {
        &self.secret
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}
