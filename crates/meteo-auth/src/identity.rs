//! # Identity Sources
//!
//! Decide which [`Identity`] a login request receives.
//!
//! - [`EphemeralIdentities`] mints a fresh random subject for any email and
//!   password. It performs no password check and exists for demos and tests.
//! - [`StaticUserStore`] holds a fixed set of users with Argon2 PHC password
//!   hashes, loaded from YAML at startup, and rejects unknown emails and wrong
//!   passwords with the same [`LoginError::InvalidCredentials`]. Unknown emails
//!   are verified against a placeholder hash so both paths cost one Argon2 run,
//!   and every verification runs on the blocking pool.
//!
//! Users file format:
//!
//! ```yaml
//! users:
//!   - email: a@b.com
//!     subject: 6f1c2a4e-0d7b-4c55-9d0e-3b7a5f4e2c11
//!     password_hash: "$argon2id$v=19$m=19456,t=2,p=1$..."
//! ```

use std::collections::HashMap;
use std::path::Path;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::claims::Identity;
use crate::error::{ConfigError, LoginError};

/// Resolves login credentials to an identity.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, LoginError>;
}

/// Issues a new random subject on every call. No password check.
#[derive(Debug, Default, Clone, Copy)]
pub struct EphemeralIdentities;

#[async_trait]
impl IdentitySource for EphemeralIdentities {
    async fn authenticate(&self, email: &str, _password: &str) -> Result<Identity, LoginError> {
        Ok(Identity::ephemeral(email))
    }
}

/// One configured user.
#[derive(Clone, Deserialize)]
pub struct UserRecord {
    pub email: String,
    pub subject: String,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("email", &self.email)
            .field("subject", &self.subject)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct UsersFile {
    users: Vec<UserRecord>,
}

/// Fixed set of users keyed by lower-cased email.
#[derive(Clone)]
pub struct StaticUserStore {
    users: HashMap<String, UserRecord>,
    /// Verified against when the email is unknown.
    placeholder_hash: String,
}

/// Hashed once per store; never matches a real login in practice.
const PLACEHOLDER_PASSWORD: &str = "meteo-placeholder-password";

impl StaticUserStore {
    /// Build a store, rejecting duplicate emails and unparseable hashes.
    pub fn new(records: Vec<UserRecord>) -> Result<Self, ConfigError> {
        let mut users = HashMap::with_capacity(records.len());
        for record in records {
            PasswordHash::new(&record.password_hash).map_err(|e| {
                ConfigError::UserStore(format!("bad password hash for {}: {e}", record.email))
            })?;
            if record.subject.trim().is_empty() {
                return Err(ConfigError::UserStore(format!(
                    "empty subject for {}",
                    record.email
                )));
            }
            let key = record.email.to_ascii_lowercase();
            if users.contains_key(&key) {
                return Err(ConfigError::UserStore(format!(
                    "duplicate user {}",
                    record.email
                )));
            }
            users.insert(key, record);
        }
        Ok(Self {
            users,
            placeholder_hash: hash_password(PLACEHOLDER_PASSWORD)?,
        })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let file: UsersFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::UserStore(e.to_string()))?;
        Self::new(file.users)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::UserStore(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl std::fmt::Debug for StaticUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticUserStore")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl IdentitySource for StaticUserStore {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, LoginError> {
        let record = self.users.get(&email.to_ascii_lowercase());
        let hash = record
            .map_or(&self.placeholder_hash, |r| &r.password_hash)
            .clone();
        let password = Zeroizing::new(password.to_owned());

        let matched = tokio::task::spawn_blocking(move || password_matches(&password, &hash))
            .await
            .map_err(|e| LoginError::Unavailable(e.to_string()))??;

        match record {
            Some(record) if matched => {
                Ok(Identity::new(record.subject.clone(), record.email.clone()))
            }
            Some(_) => Err(LoginError::InvalidCredentials),
            None => {
                tracing::debug!("login for unknown email");
                Err(LoginError::InvalidCredentials)
            }
        }
    }
}

fn password_matches(password: &str, phc: &str) -> Result<bool, LoginError> {
    let parsed = PasswordHash::new(phc).map_err(|e| LoginError::Unavailable(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash a password into an Argon2id PHC string suitable for the users file.
pub fn hash_password(password: &str) -> Result<String, ConfigError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ConfigError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> StaticUserStore {
        StaticUserStore::new(vec![UserRecord {
            email: "Alice@Example.com".into(),
            subject: "user-alice".into(),
            password_hash: hash_password("correct horse").unwrap(),
        }])
        .unwrap()
    }

    #[tokio::test]
    async fn ephemeral_accepts_anything_with_fresh_subjects() {
        let source = EphemeralIdentities;
        let a = source.authenticate("a@b.com", "x").await.unwrap();
        let b = source.authenticate("a@b.com", "").await.unwrap();
        assert_eq!(a.email, "a@b.com");
        assert_ne!(a.subject, b.subject);
    }

    #[tokio::test]
    async fn static_store_accepts_correct_password() {
        let identity = store()
            .authenticate("alice@example.com", "correct horse")
            .await
            .unwrap();
        assert_eq!(identity.subject, "user-alice");
        assert_eq!(identity.email, "Alice@Example.com");
    }

    #[tokio::test]
    async fn static_store_subject_is_stable() {
        let store = store();
        let a = store.authenticate("alice@example.com", "correct horse").await.unwrap();
        let b = store.authenticate("ALICE@example.com", "correct horse").await.unwrap();
        assert_eq!(a.subject, b.subject);
    }

    #[tokio::test]
    async fn static_store_rejects_wrong_password_and_unknown_user_alike() {
        let store = store();
        assert_eq!(
            store.authenticate("alice@example.com", "battery staple").await,
            Err(LoginError::InvalidCredentials)
        );
        assert_eq!(
            store.authenticate("bob@example.com", "correct horse").await,
            Err(LoginError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn unknown_email_is_verified_against_placeholder() {
        let store = store();
        assert!(PasswordHash::new(&store.placeholder_hash).is_ok());
        assert_eq!(password_matches(PLACEHOLDER_PASSWORD, &store.placeholder_hash), Ok(true));
        assert_eq!(
            store.authenticate("nobody@example.com", PLACEHOLDER_PASSWORD).await,
            Err(LoginError::InvalidCredentials)
        );
    }

    #[test]
    fn store_debug_hides_hashes() {
        let store = store();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("argon2"));
        assert!(rendered.contains("users: 1"));
    }

    #[test]
    fn rejects_duplicate_emails() {
        let hash = hash_password("pw").unwrap();
        let record = |email: &str| UserRecord {
            email: email.into(),
            subject: "s".into(),
            password_hash: hash.clone(),
        };
        let err = StaticUserStore::new(vec![record("a@b.com"), record("A@B.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::UserStore(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn rejects_unparseable_hash() {
        let err = StaticUserStore::new(vec![UserRecord {
            email: "a@b.com".into(),
            subject: "s".into(),
            password_hash: "plaintext".into(),
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UserStore(_)));
    }

    #[test]
    fn loads_yaml() {
        let yaml = format!(
            "users:\n  - email: a@b.com\n    subject: s-1\n    password_hash: \"{}\"\n",
            hash_password("pw").unwrap()
        );
        let store = StaticUserStore::from_yaml_str(&yaml).unwrap();
        assert_eq!(store.len(), 1);
        assert!(StaticUserStore::from_yaml_str("users: nope").is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = StaticUserStore::from_file(Path::new("/nonexistent/users.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::UserStore(_)));
    }

    #[test]
    fn record_debug_redacts_hash() {
        let record = UserRecord {
            email: "a@b.com".into(),
            subject: "s".into(),
            password_hash: "$argon2id$secret".into(),
        };
        assert!(!format!("{record:?}").contains("secret"));
    }
}
