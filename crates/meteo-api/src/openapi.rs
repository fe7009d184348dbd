//! # OpenAPI Documents
//!
//! One document per API version, served at `/openapi/v{N}.json`. Each
//! contains only that version's operations.
//!
//! ## Security advertisement
//!
//! The security section is not part of the derived documents. It is built on
//! every document request by [`DocumentSecuritySection::build`], which asks
//! the [`SchemeRegistry`] which schemes are active and adds only those:
//!
//! - each recognised scheme gets a component entry;
//! - every operation lists every active scheme as an alternative
//!   requirement, and public operations additionally list `{}` (anonymous);
//! - an empty registry yields no security section at all.
//!
//! Registry names outside [`AuthScheme`] are ignored.

use axum::extract::{Path, State};
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use meteo_auth::{AuthScheme, RegistryError, SchemeDescription, SchemeRegistry};
use meteo_core::{ApiVersion, RouteTable};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use utoipa::openapi::path::{Operation, PathItem};
use utoipa::openapi::security::{
    ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme,
};
use utoipa::{Modify, OpenApi};

use crate::error::AppError;
use crate::state::AppState;

/// Document for API version 1.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "meteo API",
        version = "1",
        description = "Login and public weather forecasts."
    ),
    paths(
        crate::routes::login::login,
        crate::routes::forecast::weather_forecast,
    ),
    components(schemas(
        crate::routes::login::LoginRequest,
        crate::routes::login::LoginResponse,
        crate::routes::forecast::WeatherForecast,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "auth", description = "Bearer token issuance"),
        (name = "forecast", description = "Mock weather forecasts"),
    )
)]
pub struct V1Doc;

/// Document for API version 2.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "meteo API",
        version = "2",
        description = "Authenticated weather forecasts."
    ),
    paths(crate::routes::forecast::weather_forecast_v2),
    components(schemas(
        crate::routes::forecast::WeatherForecast,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags((name = "forecast", description = "Mock weather forecasts"))
)]
pub struct V2Doc;

/// The derived document for a version, without a security section.
pub fn base_document(version: ApiVersion) -> Option<utoipa::openapi::OpenApi> {
    match version {
        ApiVersion::V1 => Some(V1Doc::openapi()),
        ApiVersion::V2 => Some(V2Doc::openapi()),
        _ => None,
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvertiseError {
    /// Generation was cancelled before the registry answered.
    #[error("document generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<AdvertiseError> for AppError {
    fn from(err: AdvertiseError) -> Self {
        match err {
            AdvertiseError::Cancelled => Self::ServiceUnavailable(err.to_string()),
            AdvertiseError::Registry(inner) => Self::Internal(inner.to_string()),
        }
    }
}

/// Active security schemes for one version's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSecuritySection {
    schemes: Vec<AuthScheme>,
    /// `(method, versioned path)` of operations reachable without a credential.
    public: Vec<(Method, String)>,
}

impl DocumentSecuritySection {
    /// Read the registry and collect the recognised schemes.
    ///
    /// Aborts with [`AdvertiseError::Cancelled`] as soon as `cancel` fires;
    /// nothing partial is returned.
    pub async fn build<H>(
        registry: &dyn SchemeRegistry,
        routes: &RouteTable<H>,
        version: ApiVersion,
        cancel: &CancellationToken,
    ) -> Result<Self, AdvertiseError> {
        let names = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AdvertiseError::Cancelled),
            names = registry.registered_schemes() => names?,
        };

        let mut schemes: Vec<AuthScheme> = Vec::new();
        for name in &names {
            match AuthScheme::from_name(name) {
                Some(scheme) if !schemes.contains(&scheme) => schemes.push(scheme),
                Some(_) => {}
                None => tracing::debug!(scheme = %name, "ignoring unrecognised security scheme"),
            }
        }
        schemes.sort_unstable();

        let public = routes
            .routes_for(version)
            .filter(|route| !route.requires_auth())
            .map(|route| (route.method().clone(), route.versioned_path()))
            .collect();

        Ok(Self { schemes, public })
    }

    pub fn schemes(&self) -> &[AuthScheme] {
        &self.schemes
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public
            .iter()
            .any(|(m, p)| m == method && p.eq_ignore_ascii_case(path))
    }
}

impl Modify for DocumentSecuritySection {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.security = None;
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.clear();
        }
        if self.is_empty() {
            for item in openapi.paths.paths.values_mut() {
                for (_, operation) in operations_mut(item) {
                    operation.security = None;
                }
            }
            return;
        }

        let components = openapi.components.get_or_insert_with(Default::default);
        for scheme in &self.schemes {
            components.add_security_scheme(scheme.name(), security_scheme(*scheme));
        }

        let alternatives: Vec<SecurityRequirement> = self
            .schemes
            .iter()
            .map(|scheme| SecurityRequirement::new(scheme.name(), Vec::<String>::new()))
            .collect();
        for (path, item) in openapi.paths.paths.iter_mut() {
            for (method, operation) in operations_mut(item) {
                let mut security = alternatives.clone();
                if self.is_public(&method, path) {
                    security.push(SecurityRequirement::default());
                }
                operation.security = Some(security);
            }
        }
    }
}

fn security_scheme(scheme: AuthScheme) -> SecurityScheme {
    match scheme.description() {
        SchemeDescription::Http {
            bearer_format,
            description,
            ..
        } => SecurityScheme::Http(
            HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format(bearer_format)
                .description(Some(description))
                .build(),
        ),
        SchemeDescription::ApiKeyHeader {
            header,
            description,
        } => SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
            header,
            description,
        ))),
    }
}

fn operations_mut(item: &mut PathItem) -> impl Iterator<Item = (Method, &mut Operation)> + '_ {
    [
        (Method::GET, item.get.as_mut()),
        (Method::PUT, item.put.as_mut()),
        (Method::POST, item.post.as_mut()),
        (Method::DELETE, item.delete.as_mut()),
        (Method::OPTIONS, item.options.as_mut()),
        (Method::HEAD, item.head.as_mut()),
        (Method::PATCH, item.patch.as_mut()),
        (Method::TRACE, item.trace.as_mut()),
    ]
    .into_iter()
    .filter_map(|(method, operation)| operation.map(|op| (method, op)))
}

/// Serves `/openapi/{document}` where document is `v{N}.json`. Unauthenticated.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi/{document}", get(document))
}

async fn document(
    State(state): State<AppState>,
    Path(document): Path<String>,
) -> Result<Json<utoipa::openapi::OpenApi>, AppError> {
    let not_found = || AppError::NotFound(format!("/openapi/{document}"));
    let version = document
        .strip_suffix(".json")
        .and_then(|name| ApiVersion::parse_segment(name).ok())
        .filter(|version| state.routes.versions().contains(version))
        .ok_or_else(not_found)?;
    let mut doc = base_document(version).ok_or_else(not_found)?;

    let cancel = state.shutdown.child_token();
    let section =
        DocumentSecuritySection::build(state.gate.as_ref(), &state.routes, version, &cancel)
            .await?;
    section.modify(&mut doc);

    tracing::debug!(%version, schemes = ?section.schemes(), "served API document");
    Ok(Json(doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{route_table, Endpoint};
    use async_trait::async_trait;
    use meteo_auth::StaticSchemeRegistry;

    fn routes() -> RouteTable<Endpoint> {
        route_table(Some(ApiVersion::V1)).unwrap()
    }

    async fn render(registry: &dyn SchemeRegistry, version: ApiVersion) -> serde_json::Value {
        let mut doc = base_document(version).unwrap();
        DocumentSecuritySection::build(registry, &routes(), version, &CancellationToken::new())
            .await
            .unwrap()
            .modify(&mut doc);
        serde_json::to_value(&doc).unwrap()
    }

    fn scheme_names(doc: &serde_json::Value) -> Vec<String> {
        doc["components"]["securitySchemes"]
            .as_object()
            .map(|schemes| schemes.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[test]
    fn documents_hold_only_their_version() {
        let v1 = V1Doc::openapi();
        assert!(v1.paths.paths.contains_key("/v1/login"));
        assert!(v1.paths.paths.contains_key("/v1/weatherforecast"));
        assert!(!v1.paths.paths.contains_key("/v2/weatherforecastv2"));

        let v2 = V2Doc::openapi();
        assert_eq!(v2.paths.paths.len(), 1);
        assert!(v2.paths.paths.contains_key("/v2/weatherforecastv2"));
        assert!(base_document(ApiVersion::major_only(3).unwrap()).is_none());
    }

    #[test]
    fn derived_documents_carry_no_security() {
        for doc in [V1Doc::openapi(), V2Doc::openapi()] {
            assert!(doc.security.is_none());
            let schemes = doc
                .components
                .as_ref()
                .map_or(0, |c| c.security_schemes.len());
            assert_eq!(schemes, 0);
        }
    }

    #[tokio::test]
    async fn bearer_only_registry_advertises_exactly_bearer() {
        let registry = StaticSchemeRegistry::from_schemes(&[AuthScheme::Bearer]);
        let doc = render(&registry, ApiVersion::V2).await;

        assert_eq!(scheme_names(&doc), vec!["Bearer"]);
        let bearer = &doc["components"]["securitySchemes"]["Bearer"];
        assert_eq!(bearer["type"], "http");
        assert_eq!(bearer["scheme"], "bearer");
        assert_eq!(bearer["bearerFormat"], "JWT");
        assert_eq!(
            doc["paths"]["/v2/weatherforecastv2"]["get"]["security"],
            serde_json::json!([{ "Bearer": [] }])
        );
    }

    #[tokio::test]
    async fn public_operations_also_allow_anonymous() {
        let registry = StaticSchemeRegistry::from_schemes(&[AuthScheme::Bearer]);
        let doc = render(&registry, ApiVersion::V1).await;
        assert_eq!(
            doc["paths"]["/v1/weatherforecast"]["get"]["security"],
            serde_json::json!([{ "Bearer": [] }, {}])
        );
        assert_eq!(
            doc["paths"]["/v1/login"]["post"]["security"],
            serde_json::json!([{ "Bearer": [] }, {}])
        );
    }

    #[tokio::test]
    async fn empty_registry_omits_security_section() {
        let doc = render(&StaticSchemeRegistry::empty(), ApiVersion::V2).await;
        assert!(scheme_names(&doc).is_empty());
        assert!(doc.get("security").is_none());
        assert!(doc["paths"]["/v2/weatherforecastv2"]["get"]
            .get("security")
            .is_none());
    }

    #[tokio::test]
    async fn both_schemes_are_alternatives() {
        let registry = StaticSchemeRegistry::from_schemes(&AuthScheme::ALL);
        let doc = render(&registry, ApiVersion::V2).await;

        assert_eq!(scheme_names(&doc), vec!["Bearer", "api_key"]);
        let api_key = &doc["components"]["securitySchemes"]["api_key"];
        assert_eq!(api_key["type"], "apiKey");
        assert_eq!(api_key["in"], "header");
        assert_eq!(api_key["name"], "X-API-Key");
        assert_eq!(
            doc["paths"]["/v2/weatherforecastv2"]["get"]["security"],
            serde_json::json!([{ "Bearer": [] }, { "api_key": [] }])
        );
    }

    #[tokio::test]
    async fn unknown_and_duplicate_names_are_ignored() {
        let registry = StaticSchemeRegistry::new(["oauth2", "bearer", "Bearer", "mtls"]);
        let section =
            DocumentSecuritySection::build(&registry, &routes(), ApiVersion::V2, &CancellationToken::new())
                .await
                .unwrap();
        assert_eq!(section.schemes(), &[AuthScheme::Bearer]);

        let unknown_only = StaticSchemeRegistry::new(["oauth2"]);
        let doc = render(&unknown_only, ApiVersion::V2).await;
        assert!(scheme_names(&doc).is_empty());
    }

    #[tokio::test]
    async fn rebuilding_is_idempotent() {
        let registry = StaticSchemeRegistry::from_schemes(&[AuthScheme::Bearer]);
        let section =
            DocumentSecuritySection::build(&registry, &routes(), ApiVersion::V1, &CancellationToken::new())
                .await
                .unwrap();
        let mut doc = base_document(ApiVersion::V1).unwrap();
        section.modify(&mut doc);
        let once = serde_json::to_value(&doc).unwrap();
        section.modify(&mut doc);
        assert_eq!(serde_json::to_value(&doc).unwrap(), once);
    }

    struct PendingRegistry;

    #[async_trait]
    impl SchemeRegistry for PendingRegistry {
        async fn registered_schemes(&self) -> Result<Vec<String>, RegistryError> {
            std::future::pending().await
        }
    }

    struct FailingRegistry;

    #[async_trait]
    impl SchemeRegistry for FailingRegistry {
        async fn registered_schemes(&self) -> Result<Vec<String>, RegistryError> {
            Err(RegistryError("backend offline".into()))
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_pending_lookup() {
        let cancel = CancellationToken::new();
        let routes = routes();
        let build = DocumentSecuritySection::build(&PendingRegistry, &routes, ApiVersion::V2, &cancel);
        cancel.cancel();
        assert_eq!(build.await, Err(AdvertiseError::Cancelled));
    }

    #[tokio::test]
    async fn already_cancelled_wins_over_ready_registry() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let registry = StaticSchemeRegistry::from_schemes(&[AuthScheme::Bearer]);
        let result =
            DocumentSecuritySection::build(&registry, &routes(), ApiVersion::V2, &cancel).await;
        assert_eq!(result, Err(AdvertiseError::Cancelled));
    }

    #[tokio::test]
    async fn registry_failure_is_reported() {
        let result = DocumentSecuritySection::build(
            &FailingRegistry,
            &routes(),
            ApiVersion::V2,
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(AdvertiseError::Registry(_))));
    }
}
