//! # Security Schemes
//!
//! The service can only ever advertise schemes it knows how to describe, so
//! the set is a closed enum. Which of them are *active* comes from a
//! [`SchemeRegistry`], read asynchronously when a document is generated.

use async_trait::async_trait;

use crate::error::RegistryError;

/// Header carrying a static API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// A security scheme the service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AuthScheme {
    /// `Authorization: Bearer <jwt>`.
    Bearer,
    /// `X-API-Key: <secret>`.
    ApiKey,
}

impl AuthScheme {
    pub const ALL: [AuthScheme; 2] = [AuthScheme::Bearer, AuthScheme::ApiKey];

    /// Registered name, also used as the document component key.
    pub fn name(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::ApiKey => "api_key",
        }
    }

    /// Case-insensitive lookup by registered name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(name.trim()))
    }

    /// How the scheme is described in a generated document.
    pub fn description(self) -> SchemeDescription {
        match self {
            AuthScheme::Bearer => SchemeDescription::Http {
                scheme: "bearer",
                bearer_format: "JWT",
                description: "JWT issued by POST /v1/login, sent as `Authorization: Bearer <token>`",
            },
            AuthScheme::ApiKey => SchemeDescription::ApiKeyHeader {
                header: API_KEY_HEADER,
                description: "Pre-shared API key for machine callers",
            },
        }
    }
}

impl std::fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Document-level description of a scheme, independent of any OpenAPI crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeDescription {
    Http {
        scheme: &'static str,
        bearer_format: &'static str,
        description: &'static str,
    },
    ApiKeyHeader {
        header: &'static str,
        description: &'static str,
    },
}

/// Source of the currently registered scheme names.
///
/// Names the service does not recognise are returned as-is; callers decide
/// whether to ignore them.
#[async_trait]
pub trait SchemeRegistry: Send + Sync {
    async fn registered_schemes(&self) -> Result<Vec<String>, RegistryError>;
}

/// Fixed list of names, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemeRegistry {
    names: Vec<String>,
}

impl StaticSchemeRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_schemes(schemes: &[AuthScheme]) -> Self {
        Self::new(schemes.iter().map(|s| s.name()))
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemeRegistry for StaticSchemeRegistry {
    async fn registered_schemes(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_case_insensitively() {
        for scheme in AuthScheme::ALL {
            assert_eq!(AuthScheme::from_name(scheme.name()), Some(scheme));
        }
        assert_eq!(AuthScheme::from_name("bearer"), Some(AuthScheme::Bearer));
        assert_eq!(AuthScheme::from_name("API_KEY"), Some(AuthScheme::ApiKey));
        assert_eq!(AuthScheme::from_name("oauth2"), None);
    }

    #[test]
    fn bearer_is_described_as_http_jwt() {
        match AuthScheme::Bearer.description() {
            SchemeDescription::Http {
                scheme,
                bearer_format,
                ..
            } => {
                assert_eq!(scheme, "bearer");
                assert_eq!(bearer_format, "JWT");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn api_key_uses_header() {
        assert!(matches!(
            AuthScheme::ApiKey.description(),
            SchemeDescription::ApiKeyHeader { header: API_KEY_HEADER, .. }
        ));
    }

    #[tokio::test]
    async fn static_registry_returns_configured_names() {
        let registry = StaticSchemeRegistry::from_schemes(&[AuthScheme::Bearer]);
        assert_eq!(registry.registered_schemes().await.unwrap(), vec!["Bearer"]);
        assert!(StaticSchemeRegistry::empty()
            .registered_schemes()
            .await
            .unwrap()
            .is_empty());
    }
}
