//! # meteo-api — Axum API Service
//!
//! Versioned weather-forecast API with bearer-token login, a per-route
//! authorization gate, and per-version OpenAPI documents whose security
//! section reflects the schemes the gate actually enforces.
//!
//! ## API Surface
//!
//! | Path                      | Auth      | Module                 |
//! |---------------------------|-----------|------------------------|
//! | `POST /v1/login`          | public    | [`routes::login`]      |
//! | `GET /v1/weatherforecast` | public    | [`routes::forecast`]   |
//! | `GET /v2/weatherforecastv2` | required | [`routes::forecast`]  |
//! | `GET /openapi/v{N}.json`  | public    | [`openapi`]            |
//! | `GET /health/*`           | public    | this module            |
//!
//! Versioned paths are not axum routes. They fall through to
//! [`dispatch::dispatch`], which resolves them against the startup
//! [`RouteTable`](meteo_core::RouteTable).
//!
//! ## Crate Policy
//!
//! - Sits at the top of the dependency DAG.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(health)
        .merge(openapi::router())
        .fallback(dispatch::dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe. Always 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 503 once shutdown has begun.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    if state.shutdown.is_cancelled() {
        return Err(AppError::ServiceUnavailable("shutting down".into()));
    }
    Ok("ready")
}
