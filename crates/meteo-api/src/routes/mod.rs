//! # Route Handlers
//!
//! Handlers are plain axum handler functions annotated for OpenAPI. They are
//! not mounted on an axum `Router` directly: [`crate::dispatch`] resolves the
//! version and runs the authorization gate first, then calls them.

pub mod forecast;
pub mod login;
