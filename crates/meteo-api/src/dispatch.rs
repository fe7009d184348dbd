//! # Versioned Dispatch
//!
//! Every versioned request falls through the axum router to [`dispatch`],
//! which consults the startup-built [`RouteTable`]:
//!
//! ```text
//! resolve(method, path) → gate (protected routes only) → Endpoint::call
//! ```
//!
//! Resolution failures and gate rejections short-circuit before any handler
//! runs. Responses for a known resource carry `api-supported-versions`.

use axum::extract::{FromRequest, FromRequestParts, Request, State};
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use meteo_core::{ApiVersion, RouteDescriptor, RouteTable, RoutingError};

use crate::auth::CallerIdentity;
use crate::error::{AppError, API_SUPPORTED_VERSIONS};
use crate::routes;
use crate::state::AppState;

/// Handler bound to a route descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    WeatherForecast,
    WeatherForecastV2,
}

impl Endpoint {
    async fn call(self, state: AppState, request: Request) -> Result<Response, AppError> {
        match self {
            Endpoint::Login => {
                let body = Json::from_request(request, &state).await;
                Ok(routes::login::login(State(state), body)
                    .await?
                    .into_response())
            }
            Endpoint::WeatherForecast => Ok(routes::forecast::weather_forecast()
                .await
                .into_response()),
            Endpoint::WeatherForecastV2 => {
                let (mut parts, _body) = request.into_parts();
                let caller = CallerIdentity::from_request_parts(&mut parts, &state).await?;
                Ok(routes::forecast::weather_forecast_v2(caller)
                    .await
                    .into_response())
            }
        }
    }
}

/// Register every route the service exposes.
///
/// `default_version` applies to requests without a version segment; `None`
/// makes the segment mandatory.
pub fn route_table(
    default_version: Option<ApiVersion>,
) -> Result<RouteTable<Endpoint>, RoutingError> {
    RouteTable::new()
        .with_default_version(default_version)
        .with_route(RouteDescriptor::public(
            Method::POST,
            "/login",
            ApiVersion::V1,
            Endpoint::Login,
        ))?
        .with_route(RouteDescriptor::public(
            Method::GET,
            "/weatherforecast",
            ApiVersion::V1,
            Endpoint::WeatherForecast,
        ))?
        .with_route(RouteDescriptor::protected(
            Method::GET,
            "/weatherforecastv2",
            ApiVersion::V2,
            Endpoint::WeatherForecastV2,
        ))
}

/// Router fallback: resolve, gate, call.
pub async fn dispatch(State(state): State<AppState>, mut request: Request) -> Response {
    let resolved = match state.routes.resolve(request.method(), request.uri().path()) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::debug!(
                method = %request.method(),
                path = %request.uri().path(),
                error = %err,
                "request not routed"
            );
            return AppError::from(err).into_response();
        }
    };

    let endpoint = *resolved.route.handler();
    let requires_auth = resolved.route.requires_auth();
    let supported = ApiVersion::join(&resolved.supported);
    tracing::debug!(
        ?endpoint,
        version = %resolved.version,
        source = ?resolved.source,
        "resolved route"
    );

    let result = if requires_auth {
        match state.gate.admit(&mut request) {
            Ok(()) => endpoint.call(state.clone(), request).await,
            Err(err) => Err(err),
        }
    } else {
        endpoint.call(state.clone(), request).await
    };

    let mut response = result.unwrap_or_else(IntoResponse::into_response);
    if let Ok(value) = HeaderValue::from_str(&supported) {
        response.headers_mut().insert(API_SUPPORTED_VERSIONS, value);
    }
    response
}
