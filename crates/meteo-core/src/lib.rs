//! # meteo-core — Foundational Types for the meteo API
//!
//! Leaf crate of the workspace. Defines the API version identifier and the
//! explicit, data-driven route table that the version resolver consults
//! before any handler runs.
//!
//! ## Key Design Principles
//!
//! 1. **Versions are values, not strings.** [`ApiVersion`] is parsed once from
//!    the URL segment and compared structurally. `v1`, `v1.0` and `v1.0.0`
//!    are the same version.
//!
//! 2. **Routes are data.** Every endpoint is a [`RouteDescriptor`] registered
//!    once at startup into a [`RouteTable`]. Dispatch is a table lookup; there
//!    is no annotation-driven binding and no "nearest version" fallback.
//!
//! 3. **Handler-agnostic.** The table is generic over the handler type so the
//!    HTTP layer decides what a handler is.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `meteo-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod routing;
pub mod version;

pub use routing::{
    RequestedVersion, Resolved, RouteDescriptor, RouteTable, RoutingError, VersionSource,
};
pub use version::{ApiVersion, VersionError};
