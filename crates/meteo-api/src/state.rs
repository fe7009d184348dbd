//! # Application State
//!
//! Shared state for the Axum application, passed to handlers via the `State`
//! extractor. Everything here is built once at startup and is immutable
//! afterwards; cloning is a handful of `Arc` bumps.

use std::sync::Arc;

use meteo_auth::{
    ConfigError, CredentialIssuer, CredentialVerifier, EphemeralIdentities, IdentitySource,
    StaticUserStore,
};
use meteo_core::{RouteTable, RoutingError};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::auth::AuthGate;
use crate::config::AppConfig;
use crate::dispatch::{route_table, Endpoint};

/// Startup failures. Always fatal.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable<Endpoint>>,
    pub gate: Arc<AuthGate>,
    pub issuer: Arc<CredentialIssuer>,
    pub identities: Arc<dyn IdentitySource>,
    /// Cancelled on shutdown; document generation derives child tokens from it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Build the state from validated configuration.
    ///
    /// Loads the users file when one is configured.
    pub fn try_from_config(
        config: AppConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, StartupError> {
        let routes = route_table(config.default_version)?;
        match config.default_version {
            Some(version) if !routes.versions().contains(&version) => {
                tracing::warn!(%version, "default API version serves no routes");
            }
            Some(version) => tracing::info!(%version, "unversioned requests use default version"),
            None => tracing::info!("version segment required on every request"),
        }

        let identities: Arc<dyn IdentitySource> = match &config.users_file {
            Some(path) => {
                let store = StaticUserStore::from_file(path)?;
                tracing::info!(users = store.len(), path = %path.display(), "loaded user store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("no users file configured; login accepts any password");
                Arc::new(EphemeralIdentities)
            }
        };

        let gate = AuthGate::new(CredentialVerifier::new(config.token.clone()), config.api_keys);
        tracing::info!(schemes = ?gate.schemes(), "authorization gate configured");

        Ok(Self {
            routes: Arc::new(routes),
            gate: Arc::new(gate),
            issuer: Arc::new(CredentialIssuer::new(config.token)),
            identities,
            shutdown,
        })
    }

    /// Replace the identity source.
    pub fn with_identities(mut self, identities: Arc<dyn IdentitySource>) -> Self {
        self.identities = identities;
        self
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("routes", &self.routes.routes().count())
            .field("gate", &self.gate)
            .field("issuer", &self.issuer)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meteo_auth::{ApiKeySet, TokenConfig};

    fn config(users_file: Option<std::path::PathBuf>) -> AppConfig {
        AppConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            token: TokenConfig::new(
                "0123456789abcdef0123456789abcdef",
                "https://meteo.local",
                "meteo-clients",
            )
            .unwrap(),
            default_version: Some(meteo_core::ApiVersion::V1),
            api_keys: ApiKeySet::default(),
            users_file,
        }
    }

    #[test]
    fn builds_from_config() {
        let state = AppState::try_from_config(config(None), CancellationToken::new()).unwrap();
        assert_eq!(state.routes.routes().count(), 3);
        assert!(!format!("{state:?}").contains("0123456789abcdef"));
    }

    #[test]
    fn unreadable_users_file_is_fatal() {
        let err = AppState::try_from_config(
            config(Some("/nonexistent/users.yaml".into())),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, StartupError::Config(ConfigError::UserStore(_))));
    }
}
