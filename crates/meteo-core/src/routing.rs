//! # Route Table and Version Resolver
//!
//! The route table is the single source of truth for what the service
//! exposes. Each [`RouteDescriptor`] binds one `(resource path, method,
//! version)` triple to a handler and records whether the route requires an
//! authenticated caller. Descriptors are registered once at startup and never
//! mutated afterwards.
//!
//! ## Resolution
//!
//! ```text
//! /v2/weatherforecastv2
//!  └┬┘└────────┬──────┘
//!  version   resource
//! ```
//!
//! 1. If the first path segment is a version token (`v` + digit) it is split
//!    off; otherwise the whole path is the resource and the configured default
//!    version applies.
//! 2. The resource is matched case-insensitively, ignoring one trailing slash.
//!    No match at all is [`RoutingError::RouteNotFound`]; a match for another
//!    method only is [`RoutingError::MethodNotAllowed`].
//! 3. The version must match a descriptor for that resource and method
//!    exactly. Anything else is [`RoutingError::UnsupportedVersion`].

use std::fmt;

use http::Method;
use thiserror::Error;

use crate::version::ApiVersion;

/// Errors from route registration and resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The requested version is malformed, missing without a default, or not
    /// offered for this resource and method.
    #[error("unsupported API version {requested} for {resource}")]
    UnsupportedVersion {
        /// The version token as presented, or `None` if the request had none.
        requested: RequestedVersion,
        /// The resource path, without the version segment.
        resource: String,
        /// Versions that do serve this resource, ascending.
        supported: Vec<ApiVersion>,
    },

    /// No descriptor serves this resource under any method or version.
    #[error("no route for {0}")]
    RouteNotFound(String),

    /// The resource exists, but not for this method.
    #[error("method {method} not allowed for {resource}")]
    MethodNotAllowed {
        method: Method,
        resource: String,
        allowed: Vec<Method>,
    },

    /// Two descriptors claim the same `(resource, method, version)`.
    #[error("duplicate route {method} {resource} for version {version}")]
    DuplicateRoute {
        method: Method,
        resource: String,
        version: ApiVersion,
    },

    /// A resource pattern is not an absolute, unversioned path.
    #[error("invalid route pattern {0:?}")]
    InvalidPattern(String),
}

/// The version token a request carried, kept verbatim for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedVersion(Option<String>);

impl RequestedVersion {
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(token) => write!(f, "{token:?}"),
            None => f.write_str("(unspecified)"),
        }
    }
}

/// Where the resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// Parsed from the URL segment.
    Path,
    /// Substituted because the request carried no version.
    Default,
}

/// One registered endpoint.
#[derive(Debug, Clone)]
pub struct RouteDescriptor<H> {
    path: String,
    method: Method,
    version: ApiVersion,
    requires_auth: bool,
    handler: H,
}

impl<H> RouteDescriptor<H> {
    /// Describe a route that any caller may reach.
    pub fn public(method: Method, path: impl Into<String>, version: ApiVersion, handler: H) -> Self {
        Self {
            path: path.into(),
            method,
            version,
            requires_auth: false,
            handler,
        }
    }

    /// Describe a route that requires an authenticated caller.
    pub fn protected(
        method: Method,
        path: impl Into<String>,
        version: ApiVersion,
        handler: H,
    ) -> Self {
        Self {
            requires_auth: true,
            ..Self::public(method, path, version, handler)
        }
    }

    /// Resource path pattern, without the version segment.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn version(&self) -> ApiVersion {
        self.version
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// The fully versioned path this route is published under (`/v1/login`).
    pub fn versioned_path(&self) -> String {
        format!("/{}{}", self.version.segment(), self.path)
    }

    fn serves(&self, resource: &str) -> bool {
        self.path.eq_ignore_ascii_case(resource)
    }

    /// GET routes also answer HEAD.
    fn answers(&self, method: &Method) -> bool {
        self.method == *method || (*method == Method::HEAD && self.method == Method::GET)
    }
}

/// Outcome of a successful lookup.
#[derive(Debug)]
pub struct Resolved<'a, H> {
    pub route: &'a RouteDescriptor<H>,
    pub version: ApiVersion,
    pub source: VersionSource,
    /// Every version that serves the resource, for `api-supported-versions`.
    pub supported: Vec<ApiVersion>,
}

/// Immutable-after-startup table of route descriptors.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<RouteDescriptor<H>>,
    default_version: Option<ApiVersion>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    /// An empty table with no default version.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default_version: None,
        }
    }

    /// Set the version assumed for requests that omit the version segment.
    pub fn with_default_version(mut self, version: Option<ApiVersion>) -> Self {
        self.default_version = version;
        self
    }

    pub fn default_version(&self) -> Option<ApiVersion> {
        self.default_version
    }

    /// Register a descriptor. Fails on malformed patterns and on duplicates.
    pub fn register(&mut self, route: RouteDescriptor<H>) -> Result<(), RoutingError> {
        let pattern = route.path.as_str();
        let first = pattern
            .strip_prefix('/')
            .and_then(|rest| rest.split('/').next())
            .ok_or_else(|| RoutingError::InvalidPattern(pattern.to_string()))?;
        if first.is_empty() || ApiVersion::is_version_segment(first) || pattern.ends_with('/') {
            return Err(RoutingError::InvalidPattern(pattern.to_string()));
        }

        let duplicate = self.routes.iter().any(|existing| {
            existing.method == route.method
                && existing.version == route.version
                && existing.serves(pattern)
        });
        if duplicate {
            return Err(RoutingError::DuplicateRoute {
                method: route.method,
                resource: route.path,
                version: route.version,
            });
        }

        self.routes.push(route);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_route(mut self, route: RouteDescriptor<H>) -> Result<Self, RoutingError> {
        self.register(route)?;
        Ok(self)
    }

    /// All registered descriptors, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteDescriptor<H>> {
        self.routes.iter()
    }

    /// Descriptors published under one version.
    pub fn routes_for(&self, version: ApiVersion) -> impl Iterator<Item = &RouteDescriptor<H>> {
        self.routes.iter().filter(move |r| r.version == version)
    }

    /// Every version that has at least one route, ascending.
    pub fn versions(&self) -> Vec<ApiVersion> {
        let mut versions: Vec<ApiVersion> = self.routes.iter().map(|r| r.version).collect();
        versions.sort_unstable();
        versions.dedup();
        versions
    }

    /// Versions that serve a resource under any method, ascending.
    pub fn supported_versions(&self, resource: &str) -> Vec<ApiVersion> {
        let resource = normalize(resource);
        let mut versions: Vec<ApiVersion> = self
            .routes
            .iter()
            .filter(|r| r.serves(resource))
            .map(|r| r.version)
            .collect();
        versions.sort_unstable();
        versions.dedup();
        versions
    }

    /// Resolve a request to exactly one descriptor.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Resolved<'_, H>, RoutingError> {
        let (token, resource) = split_version(path);
        let resource = normalize(resource);

        let serving: Vec<&RouteDescriptor<H>> =
            self.routes.iter().filter(|r| r.serves(resource)).collect();
        if serving.is_empty() {
            return Err(RoutingError::RouteNotFound(resource.to_string()));
        }

        let mut supported: Vec<ApiVersion> = serving.iter().map(|r| r.version).collect();
        supported.sort_unstable();
        supported.dedup();

        let for_method: Vec<&RouteDescriptor<H>> = serving
            .iter()
            .copied()
            .filter(|r| r.answers(method))
            .collect();
        if for_method.is_empty() {
            let mut allowed: Vec<Method> = Vec::new();
            for r in &serving {
                if !allowed.contains(&r.method) {
                    allowed.push(r.method.clone());
                }
                if r.method == Method::GET && !allowed.contains(&Method::HEAD) {
                    allowed.push(Method::HEAD);
                }
            }
            return Err(RoutingError::MethodNotAllowed {
                method: method.clone(),
                resource: resource.to_string(),
                allowed,
            });
        }

        let unsupported = || RoutingError::UnsupportedVersion {
            requested: RequestedVersion(token.map(str::to_string)),
            resource: resource.to_string(),
            supported: supported.clone(),
        };

        let (version, source) = match token {
            Some(segment) => (
                ApiVersion::parse_segment(segment).map_err(|_| unsupported())?,
                VersionSource::Path,
            ),
            None => (
                self.default_version.ok_or_else(unsupported)?,
                VersionSource::Default,
            ),
        };

        let route = for_method
            .into_iter()
            .find(|r| r.version == version)
            .ok_or_else(unsupported)?;

        Ok(Resolved {
            route,
            version,
            source,
            supported,
        })
    }
}

/// Split `/v1/rest` into `(Some("v1"), "/rest")`; unversioned paths pass through.
fn split_version(path: &str) -> (Option<&str>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (first, rest_start) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], idx),
        None => (trimmed, trimmed.len()),
    };
    if ApiVersion::is_version_segment(first) {
        (Some(first), &trimmed[rest_start..])
    } else {
        (None, path)
    }
}

fn normalize(resource: &str) -> &str {
    match resource.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => resource,
    }
}
