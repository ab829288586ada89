//! Error types for route compilation.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// A capability every mapping kind must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    GroupKey,
    RouteWeight,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::GroupKey => f.write_str("group key"),
            Capability::RouteWeight => f.write_str("route weight"),
        }
    }
}

/// Fatal errors. Any of these aborts the whole pass; no partial route
/// table is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("mapping {resource_key}: kind {kind:?} has no {capability} capability")]
    MissingCapability {
        kind: String,
        capability: Capability,
        resource_key: String,
    },

    #[error("duplicate resource key: {0}")]
    DuplicateResourceKey(String),
}

/// Errors raised while registering mapping kinds.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("kind {kind:?} registered without a {capability} capability")]
    MissingCapability { kind: String, capability: Capability },

    #[error("kind name must not be empty")]
    EmptyKind,
}
