//! # Configuration
//!
//! Command-line and environment configuration for the `meteo-api` binary.
//! Every flag has a `METEO_*` environment fallback. Values are validated once
//! in [`AppConfig::from_args`]; any error aborts startup before the listener
//! binds.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use meteo_auth::config::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};
use meteo_auth::{ApiKeySet, ConfigError, TokenConfig};
use meteo_core::ApiVersion;

/// meteo API server: versioned weather forecasts behind bearer authentication.
#[derive(Parser, Debug)]
#[command(name = "meteo-api", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Print an Argon2 hash for a users file entry.
    HashPassword(HashPasswordArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Socket address to listen on.
    #[arg(long, env = "METEO_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// HS256 signing key, at least 32 bytes.
    #[arg(long, env = "METEO_JWT_SIGNING_KEY", hide_env_values = true)]
    pub jwt_signing_key: String,

    /// Value of the `iss` claim.
    #[arg(long, env = "METEO_JWT_ISSUER")]
    pub jwt_issuer: String,

    /// Value of the `aud` claim.
    #[arg(long, env = "METEO_JWT_AUDIENCE")]
    pub jwt_audience: String,

    /// Token lifetime in seconds.
    #[arg(
        long,
        env = "METEO_TOKEN_TTL_SECS",
        default_value_t = DEFAULT_TOKEN_TTL_SECS,
        allow_negative_numbers = true
    )]
    pub token_ttl_secs: i64,

    /// Version assumed when a request path has no version segment.
    #[arg(long, env = "METEO_DEFAULT_API_VERSION", default_value = "1")]
    pub default_api_version: ApiVersion,

    /// Reject requests without a version segment instead of using the default.
    #[arg(long, env = "METEO_REQUIRE_VERSION")]
    pub require_version: bool,

    /// Static API key, `label=secret` or bare secret. Repeatable.
    #[arg(
        long = "api-key",
        env = "METEO_API_KEYS",
        value_delimiter = ',',
        hide_env_values = true
    )]
    pub api_keys: Vec<String>,

    /// YAML users file. Without it any email/password pair may log in.
    #[arg(long, env = "METEO_USERS_FILE")]
    pub users_file: Option<PathBuf>,

    #[arg(long, env = "METEO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for ServeArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServeArgs")
            .field("bind", &self.bind)
            .field("jwt_signing_key", &"[REDACTED]")
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("default_api_version", &self.default_api_version)
            .field("require_version", &self.require_version)
            .field("api_keys", &self.api_keys.len())
            .field("users_file", &self.users_file)
            .field("log_format", &self.log_format)
            .finish()
    }
}

#[derive(Args)]
pub struct HashPasswordArgs {
    /// Password to hash.
    #[arg(long, env = "METEO_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl std::fmt::Debug for HashPasswordArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashPasswordArgs { password: [REDACTED] }")
    }
}

/// Validated server configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub token: TokenConfig,
    /// `None` makes the version segment mandatory.
    pub default_version: Option<ApiVersion>,
    pub api_keys: ApiKeySet,
    pub users_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_args(args: &ServeArgs) -> Result<Self, ConfigError> {
        let token = TokenConfig::new(
            args.jwt_signing_key.as_bytes(),
            args.jwt_issuer.as_str(),
            args.jwt_audience.as_str(),
        )?
        .with_ttl(
            chrono::Duration::try_seconds(args.token_ttl_secs).ok_or(ConfigError::TtlTooLong {
                max: MAX_TOKEN_TTL_SECS,
                actual: args.token_ttl_secs,
            })?,
        )?;

        Ok(Self {
            bind: args.bind,
            token,
            default_version: (!args.require_version).then_some(args.default_api_version),
            api_keys: ApiKeySet::parse(&args.api_keys)?,
            users_file: args.users_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec![
            "meteo-api",
            "serve",
            "--jwt-signing-key",
            KEY,
            "--jwt-issuer",
            "https://meteo.local",
            "--jwt-audience",
            "meteo-clients",
        ];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    fn serve_args(extra: &[&str]) -> ServeArgs {
        match parse(extra).unwrap().command {
            Command::Serve(args) => args,
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn defaults() {
        let args = serve_args(&[]);
        assert_eq!(args.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(args.token_ttl_secs, 7 * 24 * 3600);
        assert_eq!(args.default_api_version, ApiVersion::V1);
        assert_eq!(args.log_format, LogFormat::Text);

        let config = AppConfig::from_args(&args).unwrap();
        assert_eq!(config.default_version, Some(ApiVersion::V1));
        assert!(config.api_keys.is_empty());
        assert!(config.users_file.is_none());
    }

    #[test]
    fn require_version_clears_default() {
        let config = AppConfig::from_args(&serve_args(&["--require-version"])).unwrap();
        assert_eq!(config.default_version, None);
    }

    #[test]
    fn repeatable_api_keys() {
        let config =
            AppConfig::from_args(&serve_args(&["--api-key", "ci=one", "--api-key", "two"])).unwrap();
        assert_eq!(config.api_keys.len(), 2);
    }

    #[test]
    fn short_key_is_fatal() {
        let mut args = serve_args(&[]);
        args.jwt_signing_key = "short".into();
        assert!(matches!(
            AppConfig::from_args(&args),
            Err(ConfigError::WeakSigningKey { .. })
        ));
    }

    #[test]
    fn non_positive_ttl_is_fatal() {
        let args = serve_args(&["--token-ttl-secs", "0"]);
        assert_eq!(
            AppConfig::from_args(&args).unwrap_err(),
            ConfigError::InvalidTtl(0)
        );
        let args = serve_args(&["--token-ttl-secs", "-5"]);
        assert_eq!(
            AppConfig::from_args(&args).unwrap_err(),
            ConfigError::InvalidTtl(-5)
        );
    }

    #[test]
    fn oversized_ttl_is_fatal_not_a_panic() {
        let args = serve_args(&["--token-ttl-secs", "9223372036854775807"]);
        assert_eq!(
            AppConfig::from_args(&args).unwrap_err(),
            ConfigError::TtlTooLong {
                max: MAX_TOKEN_TTL_SECS,
                actual: i64::MAX
            }
        );
        let args = serve_args(&["--token-ttl-secs", "10000000000000"]);
        assert!(matches!(
            AppConfig::from_args(&args),
            Err(ConfigError::TtlTooLong { .. })
        ));
    }

    #[test]
    fn missing_signing_key_is_a_usage_error() {
        assert!(Cli::try_parse_from(["meteo-api", "serve", "--jwt-issuer", "i", "--jwt-audience", "a"]).is_err());
    }

    #[test]
    fn bad_default_version_is_a_usage_error() {
        assert!(parse(&["--default-api-version", "zero"]).is_err());
    }

    #[test]
    fn default_version_accepts_segment_form() {
        assert_eq!(
            serve_args(&["--default-api-version", "v2"]).default_api_version,
            ApiVersion::V2
        );
        assert_eq!(
            serve_args(&["--default-api-version", "2"]).default_api_version,
            ApiVersion::V2
        );
    }

    #[test]
    fn debug_redacts_signing_key() {
        let args = serve_args(&["--api-key", "ci=topsecret"]);
        let rendered = format!("{args:?}");
        assert!(!rendered.contains(KEY));
        assert!(!rendered.contains("topsecret"));
        let config = AppConfig::from_args(&args).unwrap();
        assert!(!format!("{config:?}").contains(KEY));
    }

    #[test]
    fn hash_password_subcommand() {
        let cli = Cli::try_parse_from(["meteo-api", "hash-password", "--password", "pw"]).unwrap();
        assert!(matches!(cli.command, Command::HashPassword(_)));
    }
}
