//! # meteo-auth — Credentials for the meteo API
//!
//! Issues and verifies the credentials a caller presents to protected routes,
//! and names the closed set of security schemes the service can advertise.
//!
//! ## Components
//!
//! | Module        | Role                                                     |
//! |---------------|----------------------------------------------------------|
//! | [`config`]    | Signing key, issuer, audience, TTL. Validated once.      |
//! | [`issuer`]    | Identity → signed, time-bounded HS256 bearer token.      |
//! | [`verifier`]  | Token → Identity, checking signature, iss, aud, expiry.  |
//! | [`identity`]  | Where identities come from at login.                     |
//! | [`api_key`]   | Static API keys, compared in constant time.              |
//! | [`scheme`]    | `AuthScheme` enum and the async scheme registry seam.    |
//!
//! ## Statelessness
//!
//! Nothing here persists issued credentials. A token is valid from issuance
//! until `exp`; there is no revocation list and no refresh flow.

pub mod api_key;
pub mod claims;
pub mod config;
pub mod error;
pub mod identity;
pub mod issuer;
pub mod scheme;
pub mod verifier;

pub use api_key::ApiKeySet;
pub use claims::{Claims, Identity};
pub use config::{SigningSecret, TokenConfig};
pub use error::{ConfigError, LoginError, RegistryError, TokenError};
pub use identity::{
    hash_password, EphemeralIdentities, IdentitySource, StaticUserStore, UserRecord,
};
pub use issuer::{Credential, CredentialIssuer};
pub use scheme::{AuthScheme, SchemeDescription, SchemeRegistry, StaticSchemeRegistry};
pub use verifier::CredentialVerifier;
