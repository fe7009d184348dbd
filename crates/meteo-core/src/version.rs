//! # API Version Identifiers
//!
//! Parses and orders the version token carried in the first URL segment
//! (`/v1/...`, `/v2.1/...`, `/v1.0.3/...`).
//!
//! ## Format
//!
//! ```text
//! segment  = ("v" | "V") version
//! version  = major [ "." minor [ "." patch ] ]
//! ```
//!
//! `major` must be at least 1. Missing components default to zero, so
//! `v2`, `v2.0` and `v2.0.0` all denote the same [`ApiVersion`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error parsing an API version token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The token was empty.
    #[error("empty API version")]
    Empty,

    /// A URL segment did not start with the `v` prefix.
    #[error("API version segment must start with 'v', got {0:?}")]
    MissingPrefix(String),

    /// A component was not an unsigned integer, or there were too many components.
    #[error("malformed API version {0:?}")]
    Malformed(String),

    /// The major component was zero.
    #[error("API major version must be at least 1")]
    ZeroMajor,
}

/// An ordered, comparable API version.
///
/// Ordering is lexicographic over `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl ApiVersion {
    /// Version 1.
    pub const V1: ApiVersion = ApiVersion {
        major: 1,
        minor: 0,
        patch: 0,
    };

    /// Version 2.
    pub const V2: ApiVersion = ApiVersion {
        major: 2,
        minor: 0,
        patch: 0,
    };

    /// Build a version from its three components.
    pub fn new(major: u32, minor: u32, patch: u32) -> Result<Self, VersionError> {
        if major == 0 {
            return Err(VersionError::ZeroMajor);
        }
        Ok(Self {
            major,
            minor,
            patch,
        })
    }

    /// Build a major-only version (`vN`).
    pub fn major_only(major: u32) -> Result<Self, VersionError> {
        Self::new(major, 0, 0)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// Parse a URL segment such as `v1` or `V2.1.0`.
    pub fn parse_segment(segment: &str) -> Result<Self, VersionError> {
        if segment.is_empty() {
            return Err(VersionError::Empty);
        }
        match segment.strip_prefix(['v', 'V']) {
            Some(rest) => Self::parse_numeric(rest),
            None => Err(VersionError::MissingPrefix(segment.to_string())),
        }
    }

    /// Whether a URL segment is meant as a version token: `v` followed by a digit.
    ///
    /// Segments like `version-info` or `weatherforecast` are resources, not
    /// malformed versions.
    pub fn is_version_segment(segment: &str) -> bool {
        let mut chars = segment.chars();
        matches!(chars.next(), Some('v' | 'V')) && chars.next().is_some_and(|c| c.is_ascii_digit())
    }

    /// The URL segment form of this version (`v1`, `v2.1`).
    pub fn segment(&self) -> String {
        format!("v{self}")
    }

    /// Render a list of versions the way the `api-supported-versions` header expects.
    pub fn join(versions: &[ApiVersion]) -> String {
        versions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `1`, `2.1` or `1.2.3`, without the `v`.
    fn parse_numeric(s: &str) -> Result<Self, VersionError> {
        if s.is_empty() {
            return Err(VersionError::Empty);
        }
        let mut components = [0u32; 3];
        let mut count = 0;
        for part in s.split('.') {
            if count == components.len()
                || part.is_empty()
                || !part.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(VersionError::Malformed(s.to_string()));
            }
            components[count] = part
                .parse()
                .map_err(|_| VersionError::Malformed(s.to_string()))?;
            count += 1;
        }
        let [major, minor, patch] = components;
        Self::new(major, minor, patch)
    }
}

/// Accepts the bare form (`2`) and the segment form (`v2`).
impl FromStr for ApiVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_numeric(s.strip_prefix(['v', 'V']).unwrap_or(s))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.minor, self.patch) {
            (0, 0) => write!(f, "{}", self.major),
            (minor, 0) => write!(f, "{}.{}", self.major, minor),
            (minor, patch) => write!(f, "{}.{}.{}", self.major, minor, patch),
        }
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
