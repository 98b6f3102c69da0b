//! Error taxonomy for the scenario harness.
//!
//! - [`ConfigurationError`] aborts a run before any case executes.
//! - [`ZomeError`] is produced by the application and travels back to the
//!   caller inside an `Err` result; it never aborts anything.
//! - [`TransportError`] means a round trip could not complete; it fails the
//!   current case only.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zome_state::StorageError;

/// Invalid or unresolvable harness setup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("scenario has no agents")]
    NoAgents,

    #[error("agent name must not be empty")]
    EmptyAgentName,

    #[error("duplicate agent name: {name}")]
    DuplicateAgent { name: String },

    #[error("invalid identity for agent {agent}: {reason}")]
    InvalidIdentity { agent: String, reason: String },

    #[error("cannot read {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario config {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("application package not found: {path:?}")]
    PackageNotFound { path: PathBuf },

    #[error("invalid application package {package}: {reason}")]
    InvalidPackage { package: String, reason: String },

    #[error("zome {zome} has unknown kind {kind:?}")]
    UnknownZomeKind { zome: String, kind: String },
}

/// Failure payload returned by an application call.
///
/// Serialises externally tagged, e.g. `{"ValidationFailed": "..."}`, which is
/// the shape test authors match on inside `{"Err": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ZomeError {
    #[error("unknown operation {capability}/{function}")]
    UnknownOperation { capability: String, function: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ZomeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { address } => ZomeError::NotFound(address),
            StorageError::InvalidAddress { .. } => ZomeError::InvalidInput(err.to_string()),
            StorageError::Serialization(_) => ZomeError::Internal(err.to_string()),
        }
    }
}

/// A call round trip that could not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("application instance {instance} is unreachable")]
    InstanceUnreachable { instance: String },

    #[error("agent {agent} is not bound to instance {instance}")]
    UnknownAgent { agent: String, instance: String },
}
