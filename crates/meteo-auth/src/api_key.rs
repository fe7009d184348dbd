//! # Static API Keys
//!
//! Machine callers may present a pre-shared key in the `X-API-Key` header
//! instead of a bearer token. Keys are configured as `label=secret` or as a
//! bare secret (auto-labelled `key-N`). Lookup compares the presented value
//! against every configured secret in constant time and never exits early,
//! so response timing does not reveal how many keys exist or which one came
//! close.

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::ConfigError;

struct ApiKey {
    label: String,
    secret: Zeroizing<Vec<u8>>,
}

/// The configured set of API keys. May be empty.
#[derive(Default)]
pub struct ApiKeySet {
    keys: Vec<ApiKey>,
}

impl ApiKeySet {
    /// Parse `label=secret` or bare-secret entries.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyApiKey`] for a blank secret,
    /// [`ConfigError::DuplicateApiKey`] when two entries share a label.
    pub fn parse<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keys: Vec<ApiKey> = Vec::new();
        for (i, entry) in entries.into_iter().enumerate() {
            let entry = entry.as_ref();
            let (label, secret) = match entry.split_once('=') {
                Some((label, secret)) if !label.trim().is_empty() => {
                    (label.trim().to_string(), secret)
                }
                _ => (format!("key-{}", i + 1), entry),
            };
            if secret.trim().is_empty() {
                return Err(ConfigError::EmptyApiKey(label));
            }
            if keys.iter().any(|k| k.label == label) {
                return Err(ConfigError::DuplicateApiKey(label));
            }
            keys.push(ApiKey {
                label,
                secret: Zeroizing::new(secret.as_bytes().to_vec()),
            });
        }
        Ok(Self { keys })
    }

    /// Label of the key matching `presented`, if any.
    pub fn authenticate(&self, presented: &str) -> Option<&str> {
        let presented = presented.as_bytes();
        let mut matched: Option<&str> = None;
        for key in &self.keys {
            // ct_eq on unequal lengths returns false without a timing hint
            // beyond the length itself.
            if bool::from(key.secret.as_slice().ct_eq(presented)) && matched.is_none() {
                matched = Some(key.label.as_str());
            }
        }
        matched
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|k| k.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for ApiKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeySet")
            .field("labels", &self.labels().collect::<Vec<_>>())
            .finish()
    }
}
