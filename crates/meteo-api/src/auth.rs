//! # Authorization Gate
//!
//! Enforces a route's authentication policy before its handler runs.
//!
//! ## Accepted credentials
//!
//! ```text
//! Authorization: Bearer <jwt>   always accepted, verified by CredentialVerifier
//! X-API-Key: <secret>           accepted only when API keys are configured
//! ```
//!
//! The gate is also the [`SchemeRegistry`] the document advertiser reads, so
//! a published document can never claim a scheme the gate does not enforce.
//!
//! ## CallerIdentity
//!
//! Every admitted request gets a [`CallerIdentity`] injected into the request
//! extensions. Handlers extract it via the `FromRequestParts` impl.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use meteo_auth::scheme::API_KEY_HEADER;
use meteo_auth::{
    ApiKeySet, AuthScheme, CredentialVerifier, RegistryError, SchemeRegistry, TokenError,
};
use thiserror::Error;

use crate::error::AppError;

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated caller of a protected route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Token subject, or `api-key:<label>` for API key callers.
    pub subject: String,
    /// Present for bearer callers only.
    pub email: Option<String>,
    pub scheme: AuthScheme,
}

/// Extracts the identity the gate injected. A missing identity means the
/// route was not gated, which is treated as unauthenticated.
impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

// ── Rejection ───────────────────────────────────────────────────────────────

/// Why the gate refused a request. Logged, never returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("no credential presented")]
    MissingCredential,

    #[error("authorization header is not a bearer credential")]
    UnsupportedScheme,

    #[error("unknown API key")]
    UnknownApiKey,

    #[error(transparent)]
    Token(#[from] TokenError),
}

// ── Gate ────────────────────────────────────────────────────────────────────

/// Stateless per-request credential check. Shared behind an `Arc`.
#[derive(Debug)]
pub struct AuthGate {
    verifier: CredentialVerifier,
    api_keys: ApiKeySet,
}

impl AuthGate {
    pub fn new(verifier: CredentialVerifier, api_keys: ApiKeySet) -> Self {
        Self { verifier, api_keys }
    }

    /// Schemes this gate currently accepts.
    pub fn schemes(&self) -> Vec<AuthScheme> {
        let mut schemes = vec![AuthScheme::Bearer];
        if !self.api_keys.is_empty() {
            schemes.push(AuthScheme::ApiKey);
        }
        schemes
    }

    /// Check the request headers for an acceptable credential.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthRejection> {
        let authorization = headers.get(header::AUTHORIZATION);
        if let Some(token) = authorization
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer)
        {
            let identity = self.verifier.verify(token)?;
            return Ok(CallerIdentity {
                subject: identity.subject,
                email: Some(identity.email),
                scheme: AuthScheme::Bearer,
            });
        }

        if !self.api_keys.is_empty() {
            if let Some(presented) = headers.get(API_KEY_HEADER) {
                let label = presented
                    .to_str()
                    .ok()
                    .and_then(|key| self.api_keys.authenticate(key))
                    .ok_or(AuthRejection::UnknownApiKey)?;
                return Ok(CallerIdentity {
                    subject: format!("api-key:{label}"),
                    email: None,
                    scheme: AuthScheme::ApiKey,
                });
            }
        }

        Err(match authorization {
            Some(_) => AuthRejection::UnsupportedScheme,
            None => AuthRejection::MissingCredential,
        })
    }

    /// Authorize a request in place, injecting [`CallerIdentity`] on success.
    ///
    /// Every rejection becomes the same [`AppError::Unauthorized`]; the reason
    /// is only logged.
    pub fn admit(&self, request: &mut Request) -> Result<(), AppError> {
        match self.authorize(request.headers()) {
            Ok(caller) => {
                tracing::debug!(subject = %caller.subject, scheme = %caller.scheme, "caller admitted");
                request.extensions_mut().insert(caller);
                Ok(())
            }
            Err(rejection) => {
                tracing::warn!(
                    reason = %rejection,
                    path = %request.uri().path(),
                    "rejected unauthenticated request"
                );
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl SchemeRegistry for AuthGate {
    async fn registered_schemes(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self
            .schemes()
            .into_iter()
            .map(|scheme| scheme.name().to_string())
            .collect())
    }
}

/// `Bearer <token>`, scheme case-insensitive. Empty tokens are not bearer credentials.
fn parse_bearer(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::{Duration, Utc};
    use meteo_auth::{CredentialIssuer, Identity, TokenConfig};

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> TokenConfig {
        TokenConfig::new(KEY, "https://meteo.local", "meteo-clients").unwrap()
    }

    fn gate(api_keys: &[&str]) -> AuthGate {
        AuthGate::new(
            CredentialVerifier::new(config()),
            ApiKeySet::parse(api_keys.iter().copied()).unwrap(),
        )
    }

    fn token() -> String {
        CredentialIssuer::new(config())
            .issue(&Identity::new("subject-1", "a@b.com"))
            .unwrap()
            .into_token()
    }

    fn one_header(name: &'static str, value: impl AsRef<str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_str(value.as_ref()).unwrap());
        map
    }

    #[test]
    fn parse_bearer_accepts_any_case() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer  abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("Bearer"), None);
    }

    #[test]
    fn admits_valid_bearer_token() {
        let caller = gate(&[])
            .authorize(&one_header("authorization", format!("Bearer {}", token())))
            .unwrap();
        assert_eq!(caller.subject, "subject-1");
        assert_eq!(caller.email.as_deref(), Some("a@b.com"));
        assert_eq!(caller.scheme, AuthScheme::Bearer);
    }

    #[test]
    fn missing_header_is_missing_credential() {
        assert_eq!(
            gate(&[]).authorize(&HeaderMap::new()),
            Err(AuthRejection::MissingCredential)
        );
    }

    #[test]
    fn non_bearer_authorization_is_unsupported() {
        assert_eq!(
            gate(&[]).authorize(&one_header("authorization", "Basic dXNlcjpwYXNz")),
            Err(AuthRejection::UnsupportedScheme)
        );
    }

    #[test]
    fn expired_token_is_rejected_with_reason() {
        let expired = CredentialIssuer::new(config())
            .issue_at(&Identity::ephemeral("a@b.com"), Utc::now() - Duration::days(30))
            .unwrap()
            .into_token();
        assert_eq!(
            gate(&[]).authorize(&one_header("authorization", format!("Bearer {expired}"))),
            Err(AuthRejection::Token(TokenError::Expired))
        );
    }

    #[test]
    fn api_key_ignored_when_none_configured() {
        assert_eq!(
            gate(&[]).authorize(&one_header("x-api-key", "ci-secret")),
            Err(AuthRejection::MissingCredential)
        );
    }

    #[test]
    fn api_key_admitted_when_configured() {
        let caller = gate(&["ci=ci-secret"])
            .authorize(&one_header("x-api-key", "ci-secret"))
            .unwrap();
        assert_eq!(caller.subject, "api-key:ci");
        assert_eq!(caller.email, None);
        assert_eq!(caller.scheme, AuthScheme::ApiKey);
    }

    #[test]
    fn wrong_api_key_rejected() {
        assert_eq!(
            gate(&["ci=ci-secret"]).authorize(&one_header("x-api-key", "guess")),
            Err(AuthRejection::UnknownApiKey)
        );
    }

    #[test]
    fn schemes_follow_configuration() {
        assert_eq!(gate(&[]).schemes(), vec![AuthScheme::Bearer]);
        assert_eq!(
            gate(&["k"]).schemes(),
            vec![AuthScheme::Bearer, AuthScheme::ApiKey]
        );
    }

    #[tokio::test]
    async fn registry_reports_scheme_names() {
        assert_eq!(
            gate(&["k"]).registered_schemes().await.unwrap(),
            vec!["Bearer", "api_key"]
        );
    }

    #[test]
    fn admit_injects_identity() {
        let mut request = axum::http::Request::builder()
            .uri("/v2/weatherforecastv2")
            .header("authorization", format!("Bearer {}", token()))
            .body(axum::body::Body::empty())
            .unwrap();
        gate(&[]).admit(&mut request).unwrap();
        let caller = request.extensions().get::<CallerIdentity>().unwrap();
        assert_eq!(caller.subject, "subject-1");
    }

    #[test]
    fn admit_collapses_rejections() {
        let mut request = axum::http::Request::builder()
            .uri("/v2/weatherforecastv2")
            .body(axum::body::Body::empty())
            .unwrap();
        assert!(matches!(
            gate(&[]).admit(&mut request),
            Err(AppError::Unauthorized)
        ));
        assert!(request.extensions().get::<CallerIdentity>().is_none());
    }
}
